//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{FitConfig, FitResult, Values};
use crate::fit::MultiStartResult;
use crate::models::{Model, ModelKind, composite::NAMED_COMPOSITES};
use crate::spectrum::Spectrum;

/// Fit summary: status, parameter table and goodness of fit.
pub fn format_fit_summary(result: &FitResult, config: Option<&FitConfig>) -> String {
    let mut out = String::new();

    out.push_str("=== qfit - cQED model fit ===\n");
    out.push_str(&format!("Model: {}\n", result.model));
    if let Some(config) = config {
        out.push_str(&format!(
            "Data: {} ({})\n",
            config.data_path.display(),
            if config.complex { "complex" } else { "real" }
        ));
    }
    out.push_str(&format!(
        "Status: {} | {}\n",
        if result.success { "ok" } else { "FAILED" },
        result.message
    ));

    out.push_str("\nParameters:\n");
    out.push_str(
        format!(
            "{:<20} {:>14} {:>12} {:>14} {:<5}\n",
            "name", "value", "stderr", "initial", "vary"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<20} {:-<14} {:-<12} {:-<14} {:-<5}\n", "", "", "", "", "").trim_end());
    out.push('\n');
    for p in &result.params {
        out.push_str(
            format!(
                "{:<20} {:>14} {:>12} {:>14} {:<5}\n",
                truncate(&p.name, 20),
                fmt_num(p.value),
                p.stderr.map(fmt_num).unwrap_or_else(|| "-".to_string()),
                fmt_num(p.init_value),
                if p.vary { "yes" } else { "fixed" },
            )
            .trim_end(),
        );
        out.push('\n');
    }

    let q = &result.quality;
    out.push_str(&format!(
        "\nQuality: n={} k={} chi2={} red_chi2={} RMSE={} AIC={} BIC={} nfev={}\n",
        q.n_data,
        q.n_free,
        fmt_num(q.chi_square),
        fmt_num(q.reduced_chi_square),
        fmt_num(q.rmse),
        fmt_num(q.aic),
        fmt_num(q.bic),
        q.nfev
    ));

    out
}

/// One line per start; the chosen start is marked with `*`.
pub fn format_multistart(ms: &MultiStartResult) -> String {
    let mut out = String::new();
    out.push_str("Starts:\n");
    for (idx, r) in ms.results.iter().enumerate() {
        let chosen = if ms.best == Some(idx) { "*" } else { " " };
        out.push_str(&format!(
            "{chosen} #{idx:<3} {:<6} chi2={}\n",
            if r.success { "ok" } else { "failed" },
            fmt_num(r.quality.chi_square)
        ));
    }
    out
}

/// Catalog listing: every entry with its parameters and defaults, then
/// built-in shapes and named composites.
pub fn format_catalog() -> String {
    let mut out = String::new();
    out.push_str("Catalog models:\n");
    for kind in ModelKind::ALL {
        let entry = kind.entry();
        out.push_str(&format!(
            "  {} [{}] ({})\n",
            entry.name,
            fmt_output(entry.output),
            entry.independent
        ));
        out.push_str(&format!("      {}\n", entry.description));
        let params: Vec<String> = entry
            .params
            .iter()
            .map(|p| format!("{}={}", p.name, fmt_num(p.default)))
            .collect();
        out.push_str(&format!("      params: {}\n", params.join(", ")));
        if !entry.aliases.is_empty() {
            out.push_str(&format!("      aliases: {}\n", entry.aliases.join(", ")));
        }
    }

    out.push_str("\nBuilt-in shapes:\n");
    out.push_str("  Constant, Linear, Polynomial0..Polynomial7, LorentzPeak\n");

    out.push_str("\nComposites:\n");
    for name in NAMED_COMPOSITES {
        if let Ok(model) = Model::from_name(name) {
            out.push_str(&format!("  {name} = {}\n", model.name()));
        }
    }

    out
}

/// Two-column (or three for complex) table of a prediction.
pub fn format_prediction(x: &[f64], y: &Values) -> String {
    let mut out = String::new();
    match y {
        Values::Real(v) => {
            out.push_str(&format!("{:>16} {:>16}\n", "x", "y"));
            for (x, y) in x.iter().zip(v) {
                out.push_str(&format!("{:>16} {:>16}\n", fmt_num(*x), fmt_num(*y)));
            }
        }
        Values::Complex(v) => {
            out.push_str(&format!("{:>16} {:>16} {:>16}\n", "x", "re", "im"));
            for (x, z) in x.iter().zip(v) {
                out.push_str(&format!(
                    "{:>16} {:>16} {:>16}\n",
                    fmt_num(*x),
                    fmt_num(z.re),
                    fmt_num(z.im)
                ));
            }
        }
    }
    out
}

/// Largest and mean absolute residual of a fit.
pub fn format_residuals(residuals: &[f64]) -> String {
    if residuals.is_empty() {
        return "Residuals: none\n".to_string();
    }
    let max = residuals.iter().copied().fold(0.0_f64, f64::max);
    let mean = residuals.iter().sum::<f64>() / residuals.len() as f64;
    format!("Residuals: max |r|={} mean |r|={}\n", fmt_num(max), fmt_num(mean))
}

/// Spectrum table: frequency, magnitude, real and imaginary parts.
pub fn format_spectrum(spectrum: &Spectrum) -> String {
    let mut out = String::new();
    let freq_header = format!("freq ({})", spectrum.unit);
    out.push_str(&format!(
        "{:>16} {:>16} {:>16} {:>16}\n",
        freq_header, "|X|", "re", "im"
    ));
    for (f, z) in spectrum.frequencies.iter().zip(&spectrum.values) {
        out.push_str(&format!(
            "{:>16} {:>16} {:>16} {:>16}\n",
            fmt_num(*f),
            fmt_num(z.norm()),
            fmt_num(z.re),
            fmt_num(z.im)
        ));
    }
    out
}

fn fmt_output(kind: crate::domain::OutputKind) -> &'static str {
    match kind {
        crate::domain::OutputKind::Real => "real",
        crate::domain::OutputKind::Complex => "complex",
    }
}

/// Fixed notation for moderate magnitudes, scientific otherwise.
fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }
    let a = v.abs();
    if a == 0.0 || (1e-3..1e6).contains(&a) {
        format!("{v:.6}")
    } else {
        format!("{v:.6e}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Parameter, Parameters};
    use num_complex::Complex64;

    #[test]
    fn numbers_switch_to_scientific() {
        assert_eq!(fmt_num(1.5), "1.500000");
        assert_eq!(fmt_num(7.0e9), "7.000000e9");
        assert_eq!(fmt_num(0.0), "0.000000");
        assert_eq!(fmt_num(f64::NAN), "NaN");
    }

    #[test]
    fn summary_lists_every_parameter() {
        let params = Parameters::new(
            "CosFunc",
            vec![Parameter::new("amplitude", 1.0), Parameter::new("frequency", 5e6)],
        );
        let result = FitResult::failed("CosFunc", &params, 0, "empty dataset");
        let text = format_fit_summary(&result, None);
        assert!(text.contains("FAILED"));
        assert!(text.contains("amplitude"));
        assert!(text.contains("frequency"));
        assert!(text.contains("empty dataset"));
    }

    #[test]
    fn residual_line_reports_max_and_mean() {
        let text = format_residuals(&[0.5, 0.1, 0.3]);
        assert!(text.contains("max |r|=0.500000"), "{text}");
        assert!(text.contains("mean |r|=0.300000"), "{text}");
        assert_eq!(format_residuals(&[]), "Residuals: none\n");
    }

    #[test]
    fn catalog_lists_all_entries_and_composites() {
        let text = format_catalog();
        for kind in ModelKind::ALL {
            assert!(text.contains(kind.name()), "{}", kind.name());
        }
        assert!(text.contains("LorentzWithBackground = (LorentzPeak + Linear)"));
    }

    #[test]
    fn complex_prediction_has_three_columns() {
        let text = format_prediction(&[1.0], &Values::Complex(vec![Complex64::new(0.5, -0.5)]));
        let header = text.lines().next().unwrap();
        assert_eq!(header.split_whitespace().collect::<Vec<_>>(), vec!["x", "re", "im"]);
    }

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("exponential_offset_long_name", 10), "exponenti.");
        assert_eq!(truncate("tau", 10), "tau");
    }
}
