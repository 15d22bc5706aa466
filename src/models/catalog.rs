//! Named model catalog.
//!
//! Each [`ModelKind`] has one static [`CatalogEntry`]: display name, aliases,
//! parameter order with defaults and bounds, and output kind. Evaluation maps
//! a parameter slice (catalog order) onto the closed-form functions in
//! [`crate::models::functions`].

use std::f64::consts::PI;

use crate::domain::{OutputKind, Values};
use crate::error::{FitError, Result};
use crate::models::functions as f;

const INF: f64 = f64::INFINITY;

/// Default value and bounds of one catalog parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

const fn free(name: &'static str, default: f64) -> ParamSpec {
    ParamSpec {
        name,
        default,
        min: -INF,
        max: INF,
    }
}

const fn bounded(name: &'static str, default: f64, min: f64, max: f64) -> ParamSpec {
    ParamSpec {
        name,
        default,
        min,
        max,
    }
}

/// Static description of a catalog model.
#[derive(Debug)]
pub struct CatalogEntry {
    pub kind: ModelKind,
    pub name: &'static str,
    /// Alternative lookup names (case-insensitive).
    pub aliases: &'static [&'static str],
    pub independent: &'static str,
    pub description: &'static str,
    pub output: OutputKind,
    pub params: &'static [ParamSpec],
}

/// Degree of the background polynomial of the `PolyBgHangerFuncAmplitude` entry.
pub const POLY_BG_DEGREE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    RandomizedBenchmarkingDecay,
    LorentzFunc,
    Lorentzian,
    TwinLorentzFunc,
    QubitFreqDac,
    QubitFreqFlux,
    CosFunc,
    ExpDecayFunc,
    ExpDampOscFunc,
    GaussExpDampOscFunc,
    ExpDampDblOscFunc,
    HangerFuncAmplitude,
    HangerFuncComplex,
    PolyBgHangerFuncAmplitude,
    SlopedHangerFuncAmplitude,
    SlopedHangerFuncComplex,
    LinearWithBackground,
}

const HANGER_PARAMS: [ParamSpec; 5] = [
    bounded("f0", 7.0, 0.0, INF),
    bounded("Q", 1e4, 0.0, INF),
    bounded("Qe", 2e4, 0.0, INF),
    free("A", 1.0),
    bounded("theta", 0.0, -PI, PI),
];

static CATALOG: [CatalogEntry; 17] = [
    CatalogEntry {
        kind: ModelKind::RandomizedBenchmarkingDecay,
        name: "RandomizedBenchmarkingDecay",
        aliases: &["RBModel", "rb"],
        independent: "number of Cliffords",
        description: "amplitude*p^n + offset",
        output: OutputKind::Real,
        params: &[
            free("amplitude", 0.5),
            bounded("p", 0.99, 0.0, 1.0),
            free("offset", 0.5),
        ],
    },
    CatalogEntry {
        kind: ModelKind::LorentzFunc,
        name: "LorentzFunc",
        aliases: &["lorentz"],
        independent: "frequency",
        description: "(amplitude/pi)*sigma/((f-center)^2+sigma^2)",
        output: OutputKind::Real,
        params: &[
            free("amplitude", 1.0),
            free("center", 0.0),
            bounded("sigma", 1.0, 0.0, INF),
        ],
    },
    CatalogEntry {
        kind: ModelKind::Lorentzian,
        name: "Lorentzian",
        aliases: &["LorentzianModel"],
        independent: "frequency (Hz)",
        description: "offset + (A/pi)*kappa/((f/1e9-f0)^2+kappa^2), f0 and kappa in GHz",
        output: OutputKind::Real,
        params: &[
            free("A", 1.0),
            free("offset", 0.0),
            free("f0", 5.0),
            bounded("kappa", 1e-3, 0.0, INF),
        ],
    },
    CatalogEntry {
        kind: ModelKind::TwinLorentzFunc,
        name: "TwinLorentzFunc",
        aliases: &["TwinLorentzModel", "twin_lorentz"],
        independent: "frequency",
        description: "two Lorentzian peaks plus constant background",
        output: OutputKind::Real,
        params: &[
            free("amplitude_a", 1.0),
            free("amplitude_b", 1.0),
            free("center_a", -1.0),
            free("center_b", 1.0),
            bounded("sigma_a", 1.0, 0.0, INF),
            bounded("sigma_b", 1.0, 0.0, INF),
            free("background", 0.0),
        ],
    },
    CatalogEntry {
        kind: ModelKind::QubitFreqDac,
        name: "QubitFreqDac",
        aliases: &["QubitFreqDacModel"],
        independent: "DAC voltage",
        description: "(f_max+E_c)*(asym^2+(1-asym^2)*cos^2(coef*(V-V0)))^0.25 - E_c",
        output: OutputKind::Real,
        params: &[
            free("f_max", 6e9),
            free("E_c", 250e6),
            free("dac_sweet_spot", 0.0),
            free("dac_flux_coefficient", 1.0),
            bounded("asymmetry", 0.0, 0.0, 1.0),
        ],
    },
    CatalogEntry {
        kind: ModelKind::QubitFreqFlux,
        name: "QubitFreqFlux",
        aliases: &["QubitFreqFluxModel"],
        independent: "flux",
        description: "(f_max+E_c)*sqrt(|cos(pi*(flux-dac_offset)/flux_zero)|) - E_c",
        output: OutputKind::Real,
        params: &[
            free("f_max", 6e9),
            free("E_c", 250e6),
            free("flux_zero", 1.0),
            free("dac_offset", 0.0),
        ],
    },
    CatalogEntry {
        kind: ModelKind::CosFunc,
        name: "CosFunc",
        aliases: &["CosModel", "cos"],
        independent: "time (s)",
        description: "amplitude*cos(2*pi*frequency*t+phase)+offset",
        output: OutputKind::Real,
        params: &[
            free("amplitude", 1.0),
            free("frequency", 1e6),
            free("phase", 0.0),
            free("offset", 0.0),
        ],
    },
    CatalogEntry {
        kind: ModelKind::ExpDecayFunc,
        name: "ExpDecayFunc",
        aliases: &["ExpDecayModel", "exp_decay", "t1"],
        independent: "time (s)",
        description: "amplitude*exp(-(t/tau)^n)+offset",
        output: OutputKind::Real,
        params: &[
            bounded("tau", 10e-6, 0.0, INF),
            free("amplitude", 1.0),
            free("offset", 0.0),
            free("n", 1.0),
        ],
    },
    CatalogEntry {
        kind: ModelKind::ExpDampOscFunc,
        name: "ExpDampOscFunc",
        aliases: &["ExpDampOscModel", "ramsey"],
        independent: "time (s)",
        description: "amplitude*exp(-(t/tau)^n)*(cos(2*pi*f*t+phase)+osc_offset)+exp_offset",
        output: OutputKind::Real,
        params: &[
            bounded("tau", 10e-6, 0.0, INF),
            free("n", 1.0),
            free("frequency", 1e6),
            free("phase", 0.0),
            free("amplitude", 0.5),
            free("oscillation_offset", 0.0),
            free("exponential_offset", 0.5),
        ],
    },
    CatalogEntry {
        kind: ModelKind::GaussExpDampOscFunc,
        name: "GaussExpDampOscFunc",
        aliases: &["GaussExpDampOscModel"],
        independent: "time (s)",
        description: "amplitude*exp(-(t/tau_2)^2-t/tau)*(cos(2*pi*f*t+phase)+osc_offset)+exp_offset",
        output: OutputKind::Real,
        params: &[
            bounded("tau", 10e-6, 0.0, INF),
            bounded("tau_2", 10e-6, 0.0, INF),
            free("frequency", 1e6),
            free("phase", 0.0),
            free("amplitude", 0.5),
            free("oscillation_offset", 0.0),
            free("exponential_offset", 0.5),
        ],
    },
    CatalogEntry {
        kind: ModelKind::ExpDampDblOscFunc,
        name: "ExpDampDblOscFunc",
        aliases: &["ExpDampDblOscModel"],
        independent: "time (s)",
        description: "exp(-(t/tau)^n)*(amp_1*(cos_1+o_1)+amp_2*(cos_2+o_2))+exp_offset",
        output: OutputKind::Real,
        params: &[
            bounded("tau", 10e-6, 0.0, INF),
            free("n", 1.0),
            free("freq_1", 1e6),
            free("freq_2", 2e6),
            free("phase_1", 0.0),
            free("phase_2", 0.0),
            free("amp_1", 0.25),
            free("amp_2", 0.25),
            free("osc_offset_1", 0.0),
            free("osc_offset_2", 0.0),
            free("exponential_offset", 0.5),
        ],
    },
    CatalogEntry {
        kind: ModelKind::HangerFuncAmplitude,
        name: "HangerFuncAmplitude",
        aliases: &["HangerAmplitudeModel", "hanger"],
        independent: "frequency (Hz)",
        description: "|A*(1-Q/Qe*exp(i*theta)/(1+2i*Q*(f/1e9-f0)/f0))|, f0 in GHz",
        output: OutputKind::Real,
        params: &HANGER_PARAMS,
    },
    CatalogEntry {
        kind: ModelKind::HangerFuncComplex,
        name: "HangerFuncComplex",
        aliases: &["HangerComplexModel"],
        independent: "frequency (Hz)",
        description: "A*(1-Q/Qe*exp(i*theta)/(1+2i*Q*(f/1e9-f0)/f0)), f0 in GHz",
        output: OutputKind::Complex,
        params: &HANGER_PARAMS,
    },
    CatalogEntry {
        kind: ModelKind::PolyBgHangerFuncAmplitude,
        name: "PolyBgHangerFuncAmplitude",
        aliases: &["PolyBgHangerAmplitudeModel"],
        independent: "frequency (Hz)",
        description: "|(1+sum c_k*d^k)*HangerFuncAmplitude|, d=(f/1e9-f0)/f0",
        output: OutputKind::Real,
        params: &[
            HANGER_PARAMS[0],
            HANGER_PARAMS[1],
            HANGER_PARAMS[2],
            HANGER_PARAMS[3],
            HANGER_PARAMS[4],
            free("c0", 0.0),
            free("c1", 0.0),
            free("c2", 0.0),
            free("c3", 0.0),
            free("c4", 0.0),
            free("c5", 0.0),
            free("c6", 0.0),
            free("c7", 0.0),
        ],
    },
    CatalogEntry {
        kind: ModelKind::SlopedHangerFuncAmplitude,
        name: "SlopedHangerFuncAmplitude",
        aliases: &["SlopedHangerAmplitudeModel"],
        independent: "frequency (Hz)",
        description: "|(1+slope*d)*HangerFuncAmplitude|, d=(f/1e9-f0)/f0",
        output: OutputKind::Real,
        params: &[
            HANGER_PARAMS[0],
            HANGER_PARAMS[1],
            HANGER_PARAMS[2],
            HANGER_PARAMS[3],
            HANGER_PARAMS[4],
            free("slope", 0.0),
        ],
    },
    CatalogEntry {
        kind: ModelKind::SlopedHangerFuncComplex,
        name: "SlopedHangerFuncComplex",
        aliases: &["SlopedHangerComplexModel"],
        independent: "frequency (Hz)",
        description: "(1+slope*d)*exp(i*(phi_v*(f-f[0])+phi_0))*HangerFuncComplex",
        output: OutputKind::Complex,
        params: &[
            HANGER_PARAMS[0],
            HANGER_PARAMS[1],
            HANGER_PARAMS[2],
            HANGER_PARAMS[3],
            HANGER_PARAMS[4],
            free("phi_v", 0.0),
            free("phi_0", 0.0),
            free("slope", 0.0),
        ],
    },
    CatalogEntry {
        kind: ModelKind::LinearWithBackground,
        name: "linear_with_background",
        aliases: &["LinBGModel", "LinearWithBackground"],
        independent: "x",
        description: "sqrt((a*x)^2+b^2)",
        output: OutputKind::Real,
        params: &[free("a", 1.0), free("b", 0.0)],
    },
];

impl ModelKind {
    pub const ALL: [ModelKind; 17] = [
        ModelKind::RandomizedBenchmarkingDecay,
        ModelKind::LorentzFunc,
        ModelKind::Lorentzian,
        ModelKind::TwinLorentzFunc,
        ModelKind::QubitFreqDac,
        ModelKind::QubitFreqFlux,
        ModelKind::CosFunc,
        ModelKind::ExpDecayFunc,
        ModelKind::ExpDampOscFunc,
        ModelKind::GaussExpDampOscFunc,
        ModelKind::ExpDampDblOscFunc,
        ModelKind::HangerFuncAmplitude,
        ModelKind::HangerFuncComplex,
        ModelKind::PolyBgHangerFuncAmplitude,
        ModelKind::SlopedHangerFuncAmplitude,
        ModelKind::SlopedHangerFuncComplex,
        ModelKind::LinearWithBackground,
    ];

    pub fn entry(self) -> &'static CatalogEntry {
        // CATALOG is laid out in declaration order.
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn params(self) -> &'static [ParamSpec] {
        self.entry().params
    }

    pub fn output(self) -> OutputKind {
        self.entry().output
    }

    /// Look up a catalog entry by name or alias (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim();
        CATALOG
            .iter()
            .find(|e| {
                e.name.eq_ignore_ascii_case(wanted)
                    || e.aliases.iter().any(|a| a.eq_ignore_ascii_case(wanted))
            })
            .map(|e| e.kind)
            .ok_or_else(|| FitError::UnknownModel(wanted.to_string()))
    }

    /// Evaluate over `x` with parameters `p` in catalog order.
    ///
    /// # Panics
    /// Panics if `p.len()` differs from `self.params().len()`. [`crate::models::Model`]
    /// checks this before calling.
    pub fn eval(self, x: &[f64], p: &[f64]) -> Values {
        assert_eq!(p.len(), self.params().len(), "parameter count for {}", self.name());
        let real = |g: &dyn Fn(f64) -> f64| Values::Real(x.iter().map(|&v| g(v)).collect());

        match self {
            ModelKind::RandomizedBenchmarkingDecay => {
                real(&|n| f::randomized_benchmarking_decay(n, p[0], p[1], p[2]))
            }
            ModelKind::LorentzFunc => real(&|v| f::lorentz(v, p[0], p[1], p[2])),
            ModelKind::Lorentzian => real(&|v| f::lorentzian(v, p[0], p[1], p[2], p[3])),
            ModelKind::TwinLorentzFunc => {
                real(&|v| f::twin_lorentz(v, p[0], p[1], p[2], p[3], p[4], p[5], p[6]))
            }
            ModelKind::QubitFreqDac => {
                real(&|v| f::qubit_freq_dac(v, p[0], p[1], p[2], p[3], p[4]))
            }
            ModelKind::QubitFreqFlux => real(&|v| f::qubit_freq_flux(v, p[0], p[1], p[2], p[3])),
            ModelKind::CosFunc => real(&|t| f::cos_func(t, p[0], p[1], p[2], p[3])),
            ModelKind::ExpDecayFunc => real(&|t| f::exp_decay(t, p[0], p[1], p[2], p[3])),
            ModelKind::ExpDampOscFunc => {
                real(&|t| f::exp_damp_osc(t, p[0], p[1], p[2], p[3], p[4], p[5], p[6]))
            }
            ModelKind::GaussExpDampOscFunc => {
                real(&|t| f::gauss_exp_damp_osc(t, p[0], p[1], p[2], p[3], p[4], p[5], p[6]))
            }
            ModelKind::ExpDampDblOscFunc => {
                let first = f::Oscillation {
                    frequency: p[2],
                    phase: p[4],
                    amplitude: p[6],
                    offset: p[8],
                };
                let second = f::Oscillation {
                    frequency: p[3],
                    phase: p[5],
                    amplitude: p[7],
                    offset: p[9],
                };
                real(&|t| f::exp_damp_dbl_osc(t, p[0], p[1], first, second, p[10]))
            }
            ModelKind::HangerFuncAmplitude => {
                real(&|v| f::hanger_amplitude(v, p[0], p[1], p[2], p[3], p[4]))
            }
            ModelKind::HangerFuncComplex => Values::Complex(
                x.iter()
                    .map(|&v| f::hanger_complex(v, p[0], p[1], p[2], p[3], p[4]))
                    .collect(),
            ),
            ModelKind::PolyBgHangerFuncAmplitude => {
                let coeffs = &p[5..5 + POLY_BG_DEGREE + 1];
                real(&|v| f::poly_bg_hanger_amplitude(v, p[0], p[1], p[2], p[3], p[4], coeffs))
            }
            ModelKind::SlopedHangerFuncAmplitude => {
                real(&|v| f::sloped_hanger_amplitude(v, p[0], p[1], p[2], p[3], p[4], p[5]))
            }
            ModelKind::SlopedHangerFuncComplex => {
                let f_ref = x.first().copied().unwrap_or(0.0);
                Values::Complex(
                    x.iter()
                        .map(|&v| {
                            f::sloped_hanger_complex(
                                v, f_ref, p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7],
                            )
                        })
                        .collect(),
                )
            }
            ModelKind::LinearWithBackground => {
                real(&|v| f::linear_with_background(v, p[0], p[1]))
            }
        }
    }
}
