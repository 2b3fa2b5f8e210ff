//! Kernel specification schema and loader.

use crate::error::{FormatError, Result};
use nonbond_kernel::{
    InteractionParameterTable, KernelConfig, LJ_STRIDE, NonbondedKernel, ParticleParams, VdwKind,
    select_kernel,
};
use serde::{Deserialize, Serialize};

/// Version written by [`KernelSpec::new`].
pub const FORMAT_VERSION: &str = "1.0";

/// Top-level kernel specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    /// Format version.
    #[serde(default)]
    pub version: String,
    /// Model name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Kernel axes and constants.
    pub kernel: KernelConfig,
    /// Per-particle parameters and coefficients.
    #[serde(default)]
    pub parameters: ParameterSpec,
}

/// Per-particle parameters plus the type-pair coefficients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(default)]
    pub charges: Vec<f64>,
    /// Van der Waals type per particle.
    #[serde(default)]
    pub types: Vec<usize>,
    /// Born radii, required by Generalized Born kernels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born_radii: Option<Vec<f64>>,
    #[serde(default)]
    pub coefficients: CoefficientSpec,
}

/// Van der Waals coefficients. Matrices are row-major `ntype × ntype`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "kebab-case")]
pub enum CoefficientSpec {
    /// No van der Waals coefficients.
    #[default]
    None,
    /// Per-type σ and ε, mixed with Lorentz-Berthelot rules.
    SigmaEpsilon { sigma: Vec<f64>, epsilon: Vec<f64> },
    /// Plain `C6`/`C12` matrices.
    LennardJones { c6: Vec<f64>, c12: Vec<f64> },
    /// Plain Buckingham `C6`, `A`, `B` matrices.
    Buckingham { c6: Vec<f64>, a: Vec<f64>, b: Vec<f64> },
    /// Premultiplied table exactly as the kernels read it.
    Premultiplied {
        ntype: usize,
        stride: usize,
        data: Vec<f64>,
    },
}

/// Side of a square matrix stored in `values`.
fn matrix_side(name: &str, values: &[f64]) -> Result<usize> {
    let n = (values.len() as f64).sqrt().round() as usize;
    if n * n != values.len() {
        return Err(FormatError::InvalidParameter(format!(
            "{name} has {} entries, not a square matrix",
            values.len()
        )));
    }
    Ok(n)
}

fn same_side(names: &[&str], matrices: &[&[f64]]) -> Result<usize> {
    let n = matrix_side(names[0], matrices[0])?;
    for (name, m) in names.iter().zip(matrices).skip(1) {
        if matrix_side(name, m)? != n {
            return Err(FormatError::InvalidParameter(format!(
                "{name} does not match {} in size",
                names[0]
            )));
        }
    }
    Ok(n)
}

impl CoefficientSpec {
    /// Build the premultiplied table; `ntype` sizes the all-zero table of [`None`](Self::None).
    pub fn table(&self, ntype: usize) -> Result<InteractionParameterTable> {
        let table = match self {
            Self::None => InteractionParameterTable::empty(ntype, LJ_STRIDE),
            Self::SigmaEpsilon { sigma, epsilon } => {
                InteractionParameterTable::from_sigma_epsilon(sigma, epsilon)?
            }
            Self::LennardJones { c6, c12 } => {
                let n = same_side(&["c6", "c12"], &[c6.as_slice(), c12.as_slice()])?;
                InteractionParameterTable::lennard_jones(n, |i, j| (c6[i * n + j], c12[i * n + j]))
            }
            Self::Buckingham { c6, a, b } => {
                let n = same_side(&["c6", "a", "b"], &[c6.as_slice(), a.as_slice(), b.as_slice()])?;
                InteractionParameterTable::buckingham(n, |i, j| {
                    let k = i * n + j;
                    (c6[k], a[k], b[k])
                })
            }
            Self::Premultiplied {
                ntype,
                stride,
                data,
            } => InteractionParameterTable::new(*ntype, *stride, data.clone())?,
        };
        Ok(table)
    }
}

impl From<&InteractionParameterTable> for CoefficientSpec {
    fn from(table: &InteractionParameterTable) -> Self {
        Self::Premultiplied {
            ntype: table.ntype(),
            stride: table.stride(),
            data: table.data().to_vec(),
        }
    }
}

impl ParameterSpec {
    /// Capture existing parameters and coefficients.
    pub fn from_parts(params: &ParticleParams, table: &InteractionParameterTable) -> Self {
        let born_radii = params
            .inv_sqrt_born_radii
            .as_ref()
            .map(|isa| isa.iter().map(|s| 1.0 / (s * s)).collect());
        Self {
            charges: params.charges.clone(),
            types: params.vdw_types.clone(),
            born_radii,
            coefficients: CoefficientSpec::from(table),
        }
    }

    pub fn particle_params(&self) -> Result<ParticleParams> {
        if self.charges.len() != self.types.len() {
            return Err(FormatError::InvalidParameter(format!(
                "{} charges but {} types",
                self.charges.len(),
                self.types.len()
            )));
        }
        let params = ParticleParams::new(self.charges.clone(), self.types.clone());
        match &self.born_radii {
            Some(radii) => {
                if let Some(r) = radii.iter().find(|r| !(r.is_finite() && **r > 0.0)) {
                    return Err(FormatError::InvalidParameter(format!(
                        "Born radius {r} is not positive"
                    )));
                }
                Ok(params.with_born_radii(radii))
            }
            None => Ok(params),
        }
    }

    /// Coefficient table, sized to cover every type index for [`CoefficientSpec::None`].
    pub fn interaction_table(&self) -> Result<InteractionParameterTable> {
        let ntype = self.types.iter().max().map_or(1, |t| t + 1);
        self.coefficients.table(ntype)
    }
}

impl KernelSpec {
    pub fn new(name: impl Into<String>, kernel: KernelConfig, parameters: ParameterSpec) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            name: name.into(),
            description: String::new(),
            kernel,
            parameters,
        }
    }

    /// Check that the parameters are complete and fit the kernel.
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return Err(FormatError::MissingField("version".to_string()));
        }
        self.kernel.constants.validate()?;
        let params = self.parameters.particle_params()?;
        let table = self.parameters.interaction_table()?;
        params.validate(params.len(), table.ntype())?;

        let needs_bham = self.kernel.vdw == VdwKind::Buckingham;
        let has_bham = table.stride() != LJ_STRIDE;
        if self.kernel.vdw != VdwKind::None && needs_bham != has_bham {
            return Err(FormatError::InvalidParameter(format!(
                "{:?} van der Waals cannot use a table of stride {}",
                self.kernel.vdw,
                table.stride()
            )));
        }
        Ok(())
    }

    /// Dispatch the kernel this specification names.
    pub fn select_kernel(&self) -> Result<Box<dyn NonbondedKernel>> {
        Ok(select_kernel(&self.kernel)?)
    }
}

/// Parse and validate a specification from JSON.
pub fn parse_kernel_spec(json: &str) -> Result<KernelSpec> {
    let spec: KernelSpec = serde_json::from_str(json)?;
    spec.validate()?;
    Ok(spec)
}

/// Load a specification from file.
pub fn load_kernel_spec(path: &str) -> Result<KernelSpec> {
    let json = std::fs::read_to_string(path)?;
    parse_kernel_spec(&json)
}

/// Export a specification to a JSON string.
pub fn export_kernel_spec(spec: &KernelSpec) -> Result<String> {
    Ok(serde_json::to_string_pretty(spec)?)
}

/// Save a specification to file.
pub fn save_kernel_spec(path: &str, spec: &KernelSpec) -> Result<()> {
    std::fs::write(path, export_kernel_spec(spec)?)?;
    Ok(())
}
