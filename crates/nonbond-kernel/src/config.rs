//! Kernel selection and interaction constants.

use crate::elec::ewald_coefficient;
use crate::error::{KernelError, Result};
use serde::{Deserialize, Serialize};

/// Electrostatics model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElectrostaticsKind {
    /// No electrostatics.
    None,
    /// Plain Coulomb `qq/r` under the cutoff.
    Coulomb,
    /// Reaction field.
    ReactionField,
    /// Ewald real-space term, plain cutoff.
    Ewald,
    /// Ewald real-space term, potential shifted to zero at the cutoff.
    EwaldShift,
    /// Generalized Born polarization plus Coulomb.
    GeneralizedBorn,
    /// Cubic-spline tabulated.
    Tabulated,
}

impl ElectrostaticsKind {
    pub const ALL: [Self; 7] = [
        Self::None,
        Self::Coulomb,
        Self::ReactionField,
        Self::Ewald,
        Self::EwaldShift,
        Self::GeneralizedBorn,
        Self::Tabulated,
    ];

    /// Short name used in kernel names.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Coulomb => "Coul",
            Self::ReactionField => "RF",
            Self::Ewald => "Ew",
            Self::EwaldShift => "EwSh",
            Self::GeneralizedBorn => "GB",
            Self::Tabulated => "CSTab",
        }
    }
}

/// Van der Waals model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VdwKind {
    None,
    LennardJones,
    /// Lennard-Jones with the potential shifted to zero at the cutoff.
    LennardJonesShift,
    Buckingham,
    /// Cubic-spline tabulated dispersion and repulsion.
    Tabulated,
}

impl VdwKind {
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::LennardJones,
        Self::LennardJonesShift,
        Self::Buckingham,
        Self::Tabulated,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::LennardJones => "LJ",
            Self::LennardJonesShift => "LJSh",
            Self::Buckingham => "Bham",
            Self::Tabulated => "CSTab",
        }
    }
}

/// Site layout of the outer and partner molecules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeometryKind {
    ParticleParticle,
    Water3Particle,
    Water3Water3,
    Water4Particle,
    Water4Water4,
}

impl GeometryKind {
    pub const ALL: [Self; 5] = [
        Self::ParticleParticle,
        Self::Water3Particle,
        Self::Water3Water3,
        Self::Water4Particle,
        Self::Water4Water4,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ParticleParticle => "P1P1",
            Self::Water3Particle => "W3P1",
            Self::Water3Water3 => "W3W3",
            Self::Water4Particle => "W4P1",
            Self::Water4Water4 => "W4W4",
        }
    }
}

/// What the kernel writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// Forces only.
    Force,
    /// Forces and potential energies.
    #[default]
    ForceEnergy,
}

impl OutputKind {
    pub const ALL: [Self; 2] = [Self::Force, Self::ForceEnergy];

    pub fn name(self) -> &'static str {
        match self {
            Self::Force => "F",
            Self::ForceEnergy => "VF",
        }
    }
}

/// `Elec<X>_Vdw<Y>_Geom<Z>_<F|VF>`.
pub fn kernel_name(
    elec: ElectrostaticsKind,
    vdw: VdwKind,
    geometry: GeometryKind,
    output: OutputKind,
) -> String {
    format!(
        "Elec{}_Vdw{}_Geom{}_{}",
        elec.name(),
        vdw.name(),
        geometry.name(),
        output.name()
    )
}

fn default_cutoff() -> f64 {
    1.0
}

fn default_coulomb_prefactor() -> f64 {
    // 1/(4π ε0) in kJ mol⁻¹ nm e⁻².
    138.935_458
}

fn default_epsilon_r() -> f64 {
    1.0
}

fn default_ewald_rtol() -> f64 {
    1e-5
}

fn default_table_scale() -> f64 {
    2000.0
}

fn default_table_extension() -> f64 {
    1.0
}

fn default_gb_epsilon_solvent() -> f64 {
    80.0
}

fn default_gb_table_scale() -> f64 {
    500.0
}

fn default_gb_table_range() -> f64 {
    100.0
}

/// Physical and numerical constants shared by every kernel instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionConstants {
    /// Interaction cutoff radius.
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
    /// Electrostatic conversion factor `1/(4π ε0)`.
    #[serde(default = "default_coulomb_prefactor")]
    pub coulomb_prefactor: f64,
    /// Relative dielectric constant of the medium.
    #[serde(default = "default_epsilon_r")]
    pub epsilon_r: f64,
    /// Reaction-field dielectric; 0 means infinity (conducting boundary).
    #[serde(default)]
    pub epsilon_rf: f64,
    /// Explicit reaction-field `k_rf`, overriding the dielectric formula.
    #[serde(default)]
    pub k_rf: Option<f64>,
    /// Explicit reaction-field `c_rf`, overriding the dielectric formula.
    #[serde(default)]
    pub c_rf: Option<f64>,
    /// Relative Ewald real-space strength at the cutoff, `erfc(β rc)`.
    #[serde(default = "default_ewald_rtol")]
    pub ewald_rtol: f64,
    /// Points per unit distance in generated interaction tables.
    #[serde(default = "default_table_scale")]
    pub table_scale: f64,
    /// Distance tabulated beyond the cutoff.
    #[serde(default = "default_table_extension")]
    pub table_extension: f64,
    /// Solvent dielectric for Generalized Born.
    #[serde(default = "default_gb_epsilon_solvent")]
    pub gb_epsilon_solvent: f64,
    /// Points per unit scaled distance in the Generalized Born table.
    #[serde(default = "default_gb_table_scale")]
    pub gb_table_scale: f64,
    /// Largest scaled distance in the Generalized Born table. Must exceed
    /// `cutoff / a_min` for the smallest Born radius `a_min` in use.
    #[serde(default = "default_gb_table_range")]
    pub gb_table_range: f64,
}

impl Default for InteractionConstants {
    fn default() -> Self {
        Self {
            cutoff: default_cutoff(),
            coulomb_prefactor: default_coulomb_prefactor(),
            epsilon_r: default_epsilon_r(),
            epsilon_rf: 0.0,
            k_rf: None,
            c_rf: None,
            ewald_rtol: default_ewald_rtol(),
            table_scale: default_table_scale(),
            table_extension: default_table_extension(),
            gb_epsilon_solvent: default_gb_epsilon_solvent(),
            gb_table_scale: default_gb_table_scale(),
            gb_table_range: default_gb_table_range(),
        }
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(KernelError::InvalidConstants(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

impl InteractionConstants {
    /// Defaults with the given cutoff.
    pub fn with_cutoff(cutoff: f64) -> Self {
        Self {
            cutoff,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        positive("cutoff", self.cutoff)?;
        positive("coulomb_prefactor", self.coulomb_prefactor)?;
        positive("epsilon_r", self.epsilon_r)?;
        positive("table_scale", self.table_scale)?;
        positive("gb_epsilon_solvent", self.gb_epsilon_solvent)?;
        positive("gb_table_scale", self.gb_table_scale)?;
        positive("gb_table_range", self.gb_table_range)?;
        if !(self.epsilon_rf.is_finite() && self.epsilon_rf >= 0.0) {
            return Err(KernelError::InvalidConstants(format!(
                "epsilon_rf must be zero (infinite) or positive, got {}",
                self.epsilon_rf
            )));
        }
        if !(self.table_extension.is_finite() && self.table_extension >= 0.0) {
            return Err(KernelError::InvalidConstants(format!(
                "table_extension must be non-negative, got {}",
                self.table_extension
            )));
        }
        if !(self.ewald_rtol > 0.0 && self.ewald_rtol < 1.0) {
            return Err(KernelError::InvalidConstants(format!(
                "ewald_rtol must lie in (0, 1), got {}",
                self.ewald_rtol
            )));
        }
        Ok(())
    }

    /// Charge prefactor `1/(4π ε0 ε_r)` folded into every outer charge.
    pub fn epsfac(&self) -> f64 {
        self.coulomb_prefactor / self.epsilon_r
    }

    /// Reaction-field `(k_rf, c_rf)`, from the explicit overrides when set.
    pub fn reaction_field(&self) -> (f64, f64) {
        let rc = self.cutoff;
        let rc3 = rc * rc * rc;
        let k_rf = self.k_rf.unwrap_or_else(|| {
            if self.epsilon_rf == 0.0 {
                1.0 / (2.0 * rc3)
            } else {
                let (eps_rf, eps_r) = (self.epsilon_rf, self.epsilon_r);
                (eps_rf - eps_r) / ((2.0 * eps_rf + eps_r) * rc3)
            }
        });
        let c_rf = self.c_rf.unwrap_or(1.0 / rc + k_rf * rc * rc);
        (k_rf, c_rf)
    }

    /// Ewald splitting coefficient β for this cutoff and tolerance.
    pub fn ewald_coefficient(&self) -> Result<f64> {
        ewald_coefficient(self.cutoff, self.ewald_rtol)
    }

    /// Range covered by generated distance tables.
    pub fn table_range(&self) -> f64 {
        self.cutoff + self.table_extension
    }
}

/// Complete description of one kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    pub electrostatics: ElectrostaticsKind,
    pub vdw: VdwKind,
    pub geometry: GeometryKind,
    #[serde(default)]
    pub output: OutputKind,
    #[serde(default)]
    pub constants: InteractionConstants,
}

impl KernelConfig {
    pub fn new(
        electrostatics: ElectrostaticsKind,
        vdw: VdwKind,
        geometry: GeometryKind,
        output: OutputKind,
    ) -> Self {
        Self {
            electrostatics,
            vdw,
            geometry,
            output,
            constants: InteractionConstants::default(),
        }
    }

    pub fn with_constants(mut self, constants: InteractionConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn name(&self) -> String {
        kernel_name(self.electrostatics, self.vdw, self.geometry, self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_name() {
        let config = KernelConfig::new(
            ElectrostaticsKind::ReactionField,
            VdwKind::LennardJones,
            GeometryKind::Water3Particle,
            OutputKind::ForceEnergy,
        );
        assert_eq!(config.name(), "ElecRF_VdwLJ_GeomW3P1_VF");
        assert_eq!(
            kernel_name(
                ElectrostaticsKind::None,
                VdwKind::LennardJonesShift,
                GeometryKind::ParticleParticle,
                OutputKind::Force
            ),
            "ElecNone_VdwLJSh_GeomP1P1_F"
        );
    }

    #[test]
    fn test_reaction_field_constants() {
        let mut c = InteractionConstants::with_cutoff(2.0);
        c.epsilon_rf = 0.0;
        let (k_rf, c_rf) = c.reaction_field();
        assert_relative_eq!(k_rf, 1.0 / 16.0);
        assert_relative_eq!(c_rf, 0.5 + 0.25);

        c.epsilon_rf = 1.0;
        let (k_rf, c_rf) = c.reaction_field();
        assert_relative_eq!(k_rf, 0.0);
        assert_relative_eq!(c_rf, 0.5);

        c.k_rf = Some(0.1);
        c.c_rf = Some(0.2);
        assert_eq!(c.reaction_field(), (0.1, 0.2));
    }

    #[test]
    fn test_validate() {
        assert!(InteractionConstants::default().validate().is_ok());
        assert!(InteractionConstants::with_cutoff(0.0).validate().is_err());
        let c = InteractionConstants {
            ewald_rtol: 1.5,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(KernelError::InvalidConstants(_))));
        let c = InteractionConstants {
            epsilon_rf: -1.0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_serde_defaults() {
        let json = r#"{
            "electrostatics": "reaction-field",
            "vdw": "lennard-jones-shift",
            "geometry": "water3-particle",
            "constants": { "cutoff": 0.9, "k_rf": 0.5 }
        }"#;
        let config: KernelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.electrostatics, ElectrostaticsKind::ReactionField);
        assert_eq!(config.vdw, VdwKind::LennardJonesShift);
        assert_eq!(config.geometry, GeometryKind::Water3Particle);
        assert_eq!(config.output, OutputKind::ForceEnergy);
        assert_eq!(config.constants.cutoff, 0.9);
        assert_eq!(config.constants.k_rf, Some(0.5));
        assert_eq!(config.constants.epsilon_r, 1.0);
        assert_eq!(config.constants.table_scale, 2000.0);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&OutputKind::ForceEnergy).unwrap();
        assert_eq!(json, "\"force-energy\"");
        let json = serde_json::to_string(&GeometryKind::Water4Water4).unwrap();
        assert_eq!(json, "\"water4-water4\"");
    }
}
