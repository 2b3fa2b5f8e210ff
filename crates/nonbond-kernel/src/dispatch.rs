//! Runtime kernel selection.
//!
//! A [`KernelConfig`] names one point of the configuration space. Dispatch
//! walks the four axes in turn, fixing one strategy type per step, and boxes
//! the resulting monomorphized [`PairKernel`] behind [`NonbondedKernel`].

use crate::config::{ElectrostaticsKind, GeometryKind, KernelConfig, OutputKind, VdwKind};
use crate::elec::{
    Coulomb, Electrostatics, Ewald, EwaldShift, GeneralizedBorn, NoElectrostatics, ReactionField,
    TabulatedElectrostatics,
};
use crate::error::{KernelError, Result};
use crate::geometry::{
    Geometry, ParticleParticle, Water3Particle, Water3Water3, Water4Particle, Water4Water4,
};
use crate::kernel::{ForceAndEnergy, ForceOnly, NonbondedKernel, PairKernel};
use crate::params::ParticleParams;
use crate::table::SplineTable;
use crate::vdw::{Buckingham, LennardJones, LennardJonesShift, NoVdw, TabulatedVdw, VanDerWaals};
use std::sync::Arc;

/// Interaction tables shared by tabulated kernels.
#[derive(Debug, Clone, Default)]
pub struct KernelTables {
    pub coulomb: Option<Arc<SplineTable>>,
    pub dispersion: Option<Arc<SplineTable>>,
    pub repulsion: Option<Arc<SplineTable>>,
    pub generalized_born: Option<Arc<SplineTable>>,
}

impl KernelTables {
    /// The standard tables a configuration needs, and nothing else.
    pub fn standard(config: &KernelConfig) -> Result<Self> {
        let c = &config.constants;
        let range = c.table_range();
        let mut tables = Self::default();
        if config.electrostatics == ElectrostaticsKind::Tabulated {
            tables.coulomb = Some(Arc::new(SplineTable::coulomb(c.table_scale, range)?));
        }
        if config.electrostatics == ElectrostaticsKind::GeneralizedBorn {
            tables.generalized_born = Some(Arc::new(SplineTable::generalized_born(
                c.gb_table_scale,
                c.gb_table_range,
            )?));
        }
        if config.vdw == VdwKind::Tabulated {
            tables.dispersion = Some(Arc::new(SplineTable::dispersion(c.table_scale, range)?));
            tables.repulsion = Some(Arc::new(SplineTable::repulsion(c.table_scale, range)?));
        }
        if !tables.is_empty() {
            log::debug!(
                "built tables for {}: scale {}, range {}",
                config.name(),
                c.table_scale,
                range
            );
        }
        Ok(tables)
    }

    pub fn is_empty(&self) -> bool {
        self.coulomb.is_none()
            && self.dispersion.is_none()
            && self.repulsion.is_none()
            && self.generalized_born.is_none()
    }
}

/// True when a kernel exists for the configuration.
pub fn is_supported(
    electrostatics: ElectrostaticsKind,
    vdw: VdwKind,
    geometry: GeometryKind,
) -> bool {
    if electrostatics == ElectrostaticsKind::None && vdw == VdwKind::None {
        return false;
    }
    electrostatics != ElectrostaticsKind::GeneralizedBorn
        || geometry == GeometryKind::ParticleParticle
}

/// Check that the standard Generalized Born table spans every scaled distance
/// `r · isa_i · isa_j` the particles can reach inside the cutoff.
///
/// Past `gb_table_range` lookups would extrapolate the last spline interval.
/// A no-op for other electrostatics and for parameters without Born radii.
pub fn check_born_radii(config: &KernelConfig, params: &ParticleParams) -> Result<()> {
    if config.electrostatics != ElectrostaticsKind::GeneralizedBorn {
        return Ok(());
    }
    let Some(isa) = params.inv_sqrt_born_radii.as_deref() else {
        return Ok(());
    };
    let c = &config.constants;
    let isa_max = isa.iter().fold(0.0f64, |m, &v| m.max(v));
    let x_max = c.cutoff * isa_max * isa_max;
    if !(x_max < c.gb_table_range) {
        return Err(KernelError::InvalidTable(format!(
            "generalized Born table ends at scaled distance {} but cutoff {} with smallest \
             Born radius {} reaches {}",
            c.gb_table_range,
            c.cutoff,
            1.0 / (isa_max * isa_max),
            x_max
        )));
    }
    Ok(())
}

/// Select a kernel, building whatever standard tables it needs.
pub fn select_kernel(config: &KernelConfig) -> Result<Box<dyn NonbondedKernel>> {
    config.constants.validate()?;
    let tables = KernelTables::standard(config)?;
    select_kernel_with_tables(config, &tables)
}

/// Select a kernel that reads the given tables.
pub fn select_kernel_with_tables(
    config: &KernelConfig,
    tables: &KernelTables,
) -> Result<Box<dyn NonbondedKernel>> {
    config.constants.validate()?;
    if !is_supported(config.electrostatics, config.vdw, config.geometry) {
        return Err(KernelError::UnsupportedConfiguration(config.name()));
    }
    let cutoff = config.constants.cutoff;
    for (name, table) in [
        ("coulomb", &tables.coulomb),
        ("dispersion", &tables.dispersion),
        ("repulsion", &tables.repulsion),
    ] {
        if let Some(t) = table {
            if !t.covers(cutoff) {
                log::warn!(
                    "{} table ends at {} inside cutoff {}",
                    name,
                    t.r_max(),
                    cutoff
                );
            }
        }
    }

    let kernel = with_elec(config, tables)?;
    log::debug!(
        "selected {} ({} lanes, {:?})",
        kernel.name(),
        kernel.lane_width(),
        kernel.weights()
    );
    Ok(kernel)
}

fn require(table: &Option<Arc<SplineTable>>, what: &str) -> Result<Arc<SplineTable>> {
    table
        .clone()
        .ok_or_else(|| KernelError::InvalidTable(format!("missing {what} table")))
}

fn with_elec(config: &KernelConfig, tables: &KernelTables) -> Result<Box<dyn NonbondedKernel>> {
    use ElectrostaticsKind as E;
    let c = &config.constants;
    let epsfac = c.epsfac();
    match config.electrostatics {
        E::None => with_vdw(NoElectrostatics, config, tables),
        E::Coulomb => with_vdw(Coulomb::new(epsfac), config, tables),
        E::ReactionField => with_vdw(ReactionField::from_constants(c), config, tables),
        E::Ewald => with_vdw(Ewald::from_constants(c)?, config, tables),
        E::EwaldShift => with_vdw(EwaldShift::from_constants(c)?, config, tables),
        E::GeneralizedBorn => {
            let table = require(&tables.generalized_born, "generalized Born")?;
            let gb = GeneralizedBorn::new(epsfac, c.epsilon_r, c.gb_epsilon_solvent, table);
            with_vdw(gb, config, tables)
        }
        E::Tabulated => {
            let table = require(&tables.coulomb, "coulomb")?;
            with_vdw(TabulatedElectrostatics::new(epsfac, table), config, tables)
        }
    }
}

fn with_vdw<E: Electrostatics>(
    elec: E,
    config: &KernelConfig,
    tables: &KernelTables,
) -> Result<Box<dyn NonbondedKernel>> {
    use VdwKind as V;
    let cutoff = config.constants.cutoff;
    match config.vdw {
        V::None => with_geometry(elec, NoVdw, config),
        V::LennardJones => with_geometry(elec, LennardJones, config),
        V::LennardJonesShift => with_geometry(elec, LennardJonesShift::new(cutoff), config),
        V::Buckingham => with_geometry(elec, Buckingham, config),
        V::Tabulated => {
            let vdw = TabulatedVdw::new(
                require(&tables.dispersion, "dispersion")?,
                require(&tables.repulsion, "repulsion")?,
            );
            with_geometry(elec, vdw, config)
        }
    }
}

fn with_geometry<E: Electrostatics, V: VanDerWaals>(
    elec: E,
    vdw: V,
    config: &KernelConfig,
) -> Result<Box<dyn NonbondedKernel>> {
    use GeometryKind as G;
    match config.geometry {
        G::ParticleParticle => with_output::<E, V, ParticleParticle>(elec, vdw, config),
        G::Water3Particle => with_output::<E, V, Water3Particle>(elec, vdw, config),
        G::Water3Water3 => with_output::<E, V, Water3Water3>(elec, vdw, config),
        G::Water4Particle => with_output::<E, V, Water4Particle>(elec, vdw, config),
        G::Water4Water4 => with_output::<E, V, Water4Water4>(elec, vdw, config),
    }
}

fn with_output<E: Electrostatics, V: VanDerWaals, G: Geometry>(
    elec: E,
    vdw: V,
    config: &KernelConfig,
) -> Result<Box<dyn NonbondedKernel>> {
    let cutoff = config.constants.cutoff;
    Ok(match config.output {
        OutputKind::Force => Box::new(PairKernel::<E, V, G, ForceOnly>::new(elec, vdw, cutoff)?),
        OutputKind::ForceEnergy => {
            Box::new(PairKernel::<E, V, G, ForceAndEnergy>::new(elec, vdw, cutoff)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InteractionConstants;
    use crate::flops::FlopWeights;
    use crate::kernel::KernelInputs;
    use crate::nblist::NeighborListBuilder;
    use crate::output::{KernelCounters, KernelOutput};
    use crate::params::InteractionParameterTable;
    use crate::shift::ShiftVectors;
    use approx::assert_relative_eq;
    use nonbond_math::{DefaultLane, Lane, Vec3, flatten};

    #[test]
    fn test_every_supported_combination_selects() {
        let mut selected = 0;
        for e in ElectrostaticsKind::ALL {
            for v in VdwKind::ALL {
                for g in GeometryKind::ALL {
                    for o in OutputKind::ALL {
                        let config = KernelConfig::new(e, v, g, o);
                        match select_kernel(&config) {
                            Ok(kernel) => {
                                assert!(is_supported(e, v, g));
                                assert_eq!(kernel.name(), config.name());
                                assert_eq!(kernel.weights(), FlopWeights::for_kernel(e, v, g, o));
                                assert_eq!(kernel.lane_width(), <DefaultLane as Lane>::WIDTH);
                                selected += 1;
                            }
                            Err(err) => {
                                assert!(!is_supported(e, v, g));
                                assert!(matches!(err, KernelError::UnsupportedConfiguration(_)));
                            }
                        }
                    }
                }
            }
        }
        // 7·5·5·2 combinations, minus None/None (10) and GB off P1P1 (4·5·2).
        assert_eq!(selected, 350 - 10 - 40);
    }

    #[test]
    fn test_generalized_born_water_rejected() {
        let config = KernelConfig::new(
            ElectrostaticsKind::GeneralizedBorn,
            VdwKind::LennardJones,
            GeometryKind::Water3Particle,
            OutputKind::ForceEnergy,
        );
        let err = select_kernel(&config).err().unwrap();
        assert_eq!(
            err.to_string(),
            "unsupported kernel configuration: ElecGB_VdwLJ_GeomW3P1_VF"
        );
    }

    #[test]
    fn test_born_radii_beyond_table_rejected() {
        let config = KernelConfig::new(
            ElectrostaticsKind::GeneralizedBorn,
            VdwKind::None,
            GeometryKind::ParticleParticle,
            OutputKind::ForceEnergy,
        )
        .with_constants(InteractionConstants {
            gb_table_range: 20.0,
            ..InteractionConstants::with_cutoff(1.0)
        });
        let params = ParticleParams::new(vec![0.5, -0.5], vec![0, 0]);
        // Radii 0.1 reach x = 1.0 / 0.1 = 10.
        assert!(check_born_radii(&config, &params.clone().with_born_radii(&[0.1, 0.2])).is_ok());
        // Radius 0.04 reaches x = 25, past the table.
        let err = check_born_radii(&config, &params.clone().with_born_radii(&[0.2, 0.04]));
        assert!(matches!(err, Err(KernelError::InvalidTable(_))));

        let rf = KernelConfig { electrostatics: ElectrostaticsKind::ReactionField, ..config };
        assert!(check_born_radii(&rf, &params.with_born_radii(&[0.2, 0.04])).is_ok());
    }

    #[test]
    fn test_missing_table_rejected() {
        let config = KernelConfig::new(
            ElectrostaticsKind::Tabulated,
            VdwKind::None,
            GeometryKind::ParticleParticle,
            OutputKind::Force,
        );
        let res = select_kernel_with_tables(&config, &KernelTables::default());
        assert!(matches!(res, Err(KernelError::InvalidTable(_))));
    }

    #[test]
    fn test_invalid_constants_rejected() {
        let config = KernelConfig::new(
            ElectrostaticsKind::Coulomb,
            VdwKind::None,
            GeometryKind::ParticleParticle,
            OutputKind::Force,
        )
        .with_constants(InteractionConstants::with_cutoff(-1.0));
        assert!(matches!(
            select_kernel(&config),
            Err(KernelError::InvalidConstants(_))
        ));
    }

    #[test]
    fn test_standard_tables_only_what_is_needed() {
        let config = KernelConfig::new(
            ElectrostaticsKind::ReactionField,
            VdwKind::Tabulated,
            GeometryKind::ParticleParticle,
            OutputKind::ForceEnergy,
        );
        let tables = KernelTables::standard(&config).unwrap();
        assert!(tables.coulomb.is_none());
        assert!(tables.generalized_born.is_none());
        let disp = tables.dispersion.as_ref().unwrap();
        assert!(disp.covers(config.constants.cutoff));
        assert!(tables.repulsion.is_some());
    }

    #[test]
    fn test_dispatched_reaction_field_scenario() {
        let constants = InteractionConstants {
            cutoff: 2.0,
            coulomb_prefactor: 1.0,
            k_rf: Some(0.1),
            c_rf: Some(0.5),
            ..InteractionConstants::default()
        };
        let config = KernelConfig::new(
            ElectrostaticsKind::ReactionField,
            VdwKind::None,
            GeometryKind::ParticleParticle,
            OutputKind::ForceEnergy,
        )
        .with_constants(constants);
        let kernel = select_kernel(&config).unwrap();

        let x = flatten(&[Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)]);
        let params = ParticleParams::new(vec![1.0, 1.0], vec![0, 0]);
        let table = InteractionParameterTable::empty(1, 2);
        let shifts = ShiftVectors::none();
        let inputs = KernelInputs {
            positions: &x,
            params: &params,
            table: &table,
            shifts: &shifts,
        };
        let mut b = NeighborListBuilder::new();
        b.push(0, 0, 0, &[1]);
        let nl = b.build();
        let mut out = KernelOutput::new(2, 1, 1);
        let mut counters = KernelCounters::default();
        kernel.validate(&nl, &inputs, &out).unwrap();
        kernel.evaluate(&nl, &inputs, &mut out, &mut counters);
        assert_relative_eq!(out.energies.elec[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(out.force(0).x, 0.8, epsilon = 1e-12);
        assert_eq!(counters.flops, kernel.weights().cost(1, 1));
    }

    #[test]
    fn test_tabulated_matches_analytical() {
        let x = flatten(&[Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.37, 0.21, -0.1)]);
        let params = ParticleParams::new(vec![0.4, -0.7], vec![0, 0]);
        let table = InteractionParameterTable::lennard_jones(1, |_, _| (1e-3, 1e-6));
        let shifts = ShiftVectors::none();
        let inputs = KernelInputs {
            positions: &x,
            params: &params,
            table: &table,
            shifts: &shifts,
        };
        let mut b = NeighborListBuilder::new();
        b.push(0, 0, 0, &[1]);
        let nl = b.build();

        let run = |e, v| {
            let config = KernelConfig::new(
                e,
                v,
                GeometryKind::ParticleParticle,
                OutputKind::ForceEnergy,
            );
            let kernel = select_kernel(&config).unwrap();
            let mut out = KernelOutput::new(2, 1, 1);
            kernel.evaluate(&nl, &inputs, &mut out, &mut KernelCounters::default());
            out
        };
        let exact = run(ElectrostaticsKind::Coulomb, VdwKind::LennardJones);
        let tab = run(ElectrostaticsKind::Tabulated, VdwKind::Tabulated);
        assert_relative_eq!(exact.energies.elec[0], tab.energies.elec[0], max_relative = 1e-6);
        assert_relative_eq!(exact.energies.vdw[0], tab.energies.vdw[0], max_relative = 1e-5);
        for k in 0..6 {
            assert_relative_eq!(exact.forces[k], tab.forces[k], max_relative = 1e-5);
        }
    }
}
