//! Energy of a small periodic box of three-site water.
//!
//! Run with `RUST_LOG=debug` to see kernel selection and table construction.

use nonbond::nonbond_math::{flatten, load_vec3};
use nonbond::{
    ElectrostaticsKind, ForceEvaluator, GeometryKind, InteractionConstants,
    InteractionParameterTable, KernelConfig, KernelCounters, NeighborList, NeighborListBuilder,
    OutputKind, ParticleParams, ShiftVectors, Vec3, VdwKind,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // 5 x 5 x 5 lattice of waters, 0.31 nm apart, in nm and kJ/mol.
    let n_side = 5;
    let spacing = 0.31;
    let side = spacing * n_side as f64;
    let mut points = Vec::new();
    for i in 0..n_side {
        for j in 0..n_side {
            for k in 0..n_side {
                let o = Vec3::new(i as f64, j as f64, k as f64) * spacing;
                let tilt = if (i + j + k) % 2 == 0 { 1.0 } else { -1.0 };
                points.push(o);
                points.push(o + Vec3::new(0.0816, 0.0577 * tilt, 0.0));
                points.push(o + Vec3::new(-0.0816, 0.0577 * tilt, 0.0));
            }
        }
    }
    let n_mol = points.len() / 3;
    let positions = flatten(&points);

    let charges = (0..3 * n_mol).map(|i| if i % 3 == 0 { -0.834 } else { 0.417 }).collect();
    let types = (0..3 * n_mol).map(|i| usize::from(i % 3 != 0)).collect();
    let params = ParticleParams::new(charges, types);
    let table = InteractionParameterTable::lennard_jones(2, |i, j| {
        if i == 0 && j == 0 { (2.49e-3, 2.44e-6) } else { (0.0, 0.0) }
    });
    let shifts = ShiftVectors::rectangular(Vec3::new(side, side, side))?;
    let nlist = molecule_list(&positions, n_mol, &shifts);

    println!("{} waters in a {:.3} nm box, {} outer entries", n_mol, side, nlist.len());
    println!(
        "\n{:<26} {:>14} {:>14} {:>12}",
        "Kernel", "Elec(kJ/mol)", "VdW(kJ/mol)", "|ΣF|"
    );

    for elec in [
        ElectrostaticsKind::ReactionField,
        ElectrostaticsKind::EwaldShift,
        ElectrostaticsKind::Tabulated,
    ] {
        let config = KernelConfig::new(
            elec,
            VdwKind::LennardJonesShift,
            GeometryKind::Water3Water3,
            OutputKind::ForceEnergy,
        )
        .with_constants(InteractionConstants::with_cutoff(0.7));
        let evaluator =
            ForceEvaluator::new(&config, params.clone(), table.clone(), shifts.clone(), 1)?;

        let mut output = evaluator.output();
        let mut counters = KernelCounters::default();
        evaluator.step(&positions, &nlist, &mut output, &mut counters)?;

        println!(
            "{:<26} {:>14.3} {:>14.3} {:>12.2e}",
            evaluator.kernel().name(),
            output.energies.elec[0],
            output.energies.vdw[0],
            output.net_force().norm()
        );
        log::info!(
            "{} inner iterations, {} flops",
            counters.inner_iterations,
            counters.flops
        );
    }

    Ok(())
}

/// Half list of molecule pairs, grouped by the periodic image of the partner.
fn molecule_list(positions: &[f64], n_mol: usize, shifts: &ShiftVectors) -> NeighborList {
    let mut builder = NeighborListBuilder::new();
    for a in 0..n_mol {
        let xa = load_vec3(positions, 3 * a);
        let mut by_shift = vec![Vec::new(); shifts.len()];
        for m in a + 1..n_mol {
            let s = shifts.nearest_image(&xa, &load_vec3(positions, 3 * m));
            by_shift[s].push(3 * m);
        }
        for (s, partners) in by_shift.iter().enumerate() {
            if !partners.is_empty() {
                builder.push(3 * a, s, 0, partners);
            }
        }
    }
    builder.build()
}
