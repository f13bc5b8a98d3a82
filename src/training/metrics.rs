//! Classification metrics

use crate::error::{ExplorerError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fraction of rows whose predicted class equals the true class
pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    if y_true.is_empty() {
        return Ok(0.0);
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

fn check_lengths(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(ExplorerError::Shape {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    Ok(())
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Precision, recall, F1 and support of one row of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class metrics plus accuracy, macro and support-weighted averages.
/// Rows cover the classes seen in either the true or the predicted labels.
/// Every zero division yields 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Build the report from class codes; `class_names[i]` names code `i`.
    /// Classes absent from both `y_true` and `y_pred` get no row.
    pub fn compute(
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
        class_names: &[String],
    ) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let n_classes = class_names.len();

        let code = |v: f64| -> Option<usize> {
            (v >= 0.0 && v.fract() == 0.0 && (v as usize) < n_classes).then_some(v as usize)
        };

        let mut tp = vec![0usize; n_classes];
        let mut predicted = vec![0usize; n_classes];
        let mut support = vec![0usize; n_classes];

        let unnamed = |v: f64| ExplorerError::Training(format!("label code {} has no class name", v));
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            let t_idx = code(t).ok_or_else(|| unnamed(t))?;
            let p_idx = code(p).ok_or_else(|| unnamed(p))?;
            support[t_idx] += 1;
            predicted[p_idx] += 1;
            if p_idx == t_idx {
                tp[p_idx] += 1;
            }
        }

        let classes: Vec<ClassMetrics> = class_names
            .iter()
            .enumerate()
            .filter(|(i, _)| support[*i] > 0 || predicted[*i] > 0)
            .map(|(i, name)| {
                let precision = ratio(tp[i] as f64, predicted[i] as f64);
                let recall = ratio(tp[i] as f64, support[i] as f64);
                ClassMetrics {
                    label: name.clone(),
                    precision,
                    recall,
                    f1_score: ratio(2.0 * precision * recall, precision + recall),
                    support: support[i],
                }
            })
            .collect();

        let total: usize = support.iter().sum();
        let k = classes.len() as f64;

        let macro_avg = ClassMetrics {
            label: "macro avg".to_string(),
            precision: ratio(classes.iter().map(|c| c.precision).sum(), k),
            recall: ratio(classes.iter().map(|c| c.recall).sum(), k),
            f1_score: ratio(classes.iter().map(|c| c.f1_score).sum(), k),
            support: total,
        };

        let weighted = |f: fn(&ClassMetrics) -> f64| {
            ratio(
                classes.iter().map(|c| f(c) * c.support as f64).sum(),
                total as f64,
            )
        };
        let weighted_avg = ClassMetrics {
            label: "weighted avg".to_string(),
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1_score: weighted(|c| c.f1_score),
            support: total,
        };

        Ok(Self {
            accuracy: ratio(tp.iter().sum::<usize>() as f64, total as f64),
            classes,
            macro_avg,
            weighted_avg,
        })
    }

    /// Number of test rows
    pub fn support(&self) -> usize {
        self.macro_avg.support
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.chars().count())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        let row = |f: &mut fmt::Formatter<'_>, m: &ClassMetrics| {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label, m.precision, m.recall, m.f1_score, m.support
            )
        };

        for class in &self.classes {
            row(f, class)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support()
        )?;
        row(f, &self.macro_avg)?;
        row(f, &self.weighted_avg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_accuracy_score() {
        let y_true = array![0.0, 1.0, 1.0, 0.0];
        let y_pred = array![0.0, 1.0, 0.0, 0.0];
        assert_relative_eq!(accuracy_score(&y_true, &y_pred).unwrap(), 0.75);
    }

    #[test]
    fn test_report_values() {
        let y_true = array![0.0, 0.0, 1.0, 1.0, 1.0];
        let y_pred = array![0.0, 1.0, 1.0, 1.0, 0.0];
        let report = ClassificationReport::compute(&y_true, &y_pred, &names(&["0", "1"])).unwrap();

        assert_relative_eq!(report.classes[0].precision, 0.5);
        assert_relative_eq!(report.classes[0].recall, 0.5);
        assert_relative_eq!(report.classes[1].precision, 2.0 / 3.0);
        assert_relative_eq!(report.classes[1].recall, 2.0 / 3.0);
        assert_eq!(report.classes[1].support, 3);
        assert_relative_eq!(report.accuracy, 0.6);
        assert_relative_eq!(report.macro_avg.recall, (0.5 + 2.0 / 3.0) / 2.0);
        assert_relative_eq!(report.weighted_avg.recall, 0.6);
        assert_eq!(report.support(), 5);
    }

    #[test]
    fn test_zero_division_yields_zero() {
        // class 1 is predicted once but never true
        let y_true = array![0.0, 0.0];
        let y_pred = array![0.0, 1.0];
        let report = ClassificationReport::compute(&y_true, &y_pred, &names(&["0", "1"])).unwrap();

        let absent = &report.classes[1];
        assert_eq!(absent.precision, 0.0);
        assert_eq!(absent.recall, 0.0);
        assert_eq!(absent.f1_score, 0.0);
        assert_eq!(absent.support, 0);
        assert_relative_eq!(report.macro_avg.precision, 0.5);
        assert_relative_eq!(report.macro_avg.recall, 0.25);
    }

    #[test]
    fn test_class_missing_from_both_has_no_row() {
        let y = array![0.0, 1.0, 0.0, 1.0];
        let report = ClassificationReport::compute(&y, &y, &names(&["0", "1", "2"])).unwrap();

        let labels: Vec<&str> = report.classes.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["0", "1"]);
        assert_relative_eq!(report.macro_avg.precision, 1.0);
        assert_relative_eq!(report.macro_avg.f1_score, 1.0);
        assert!(!report.to_string().lines().any(|l| l.trim_start().starts_with("2 ")));
    }

    #[test]
    fn test_unnamed_prediction_code_fails() {
        let report = ClassificationReport::compute(&array![0.0], &array![3.0], &names(&["0", "1"]));
        assert!(matches!(report, Err(ExplorerError::Training(_))));
    }

    #[test]
    fn test_report_layout() {
        let y_true = array![0.0, 1.0];
        let y_pred = array![0.0, 0.0];
        let report = ClassificationReport::compute(&y_true, &y_pred, &names(&["0", "1"])).unwrap();
        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "              precision    recall  f1-score   support");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "           0       0.50      1.00      0.67         1");
        assert_eq!(lines[3], "           1       0.00      0.00      0.00         1");
        assert_eq!(lines[5], "    accuracy                           0.50         2");
        assert_eq!(lines[6], "   macro avg       0.25      0.50      0.33         2");
        assert_eq!(lines[7], "weighted avg       0.25      0.50      0.33         2");
    }

    #[test]
    fn test_length_mismatch() {
        assert!(accuracy_score(&array![0.0], &array![0.0, 1.0]).is_err());
    }
}
