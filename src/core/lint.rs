/// Static checks over a template and its catalog.
///
/// Everything here is found without generating: dangling references,
/// malformed conditions, values that can only recurse, thin variety.

use serde::Serialize;

use crate::core::condition::Condition;
use crate::core::template::{Node, Template};
use crate::schema::catalog::{VariableCatalog, VariableEntry};

/// Findings from `lint`. Errors will misbehave at run time; warnings may.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Lint `template` and every entry of `catalog`.
pub fn lint(template: &Template, catalog: &VariableCatalog) -> LintReport {
    let mut report = LintReport::default();
    check_nodes(&template.nodes, "template", catalog, &mut report);

    for name in catalog.names() {
        if let Some(entry) = catalog.get(name) {
            check_entry(entry, catalog, &mut report);
        }
    }
    report
}

fn check_nodes(nodes: &[Node], location: &str, catalog: &VariableCatalog, report: &mut LintReport) {
    for node in nodes {
        match node {
            Node::Literal(_) => {}
            Node::Variable(name) => {
                if !catalog.contains(name) {
                    report.errors.push(format!(
                        "{} references unknown variable '{}'",
                        location, name
                    ));
                }
            }
            Node::Conditional {
                expr,
                then_branch,
                else_branch,
            } => {
                check_condition(expr, location, report);
                check_nodes(then_branch, location, catalog, report);
                if let Some(else_branch) = else_branch {
                    check_nodes(else_branch, location, catalog, report);
                }
            }
            Node::OptionGroup { options, .. } => {
                for option in options {
                    if let Some(expr) = &option.condition {
                        check_condition(
                            expr,
                            &format!("{} option '{}'", location, option.title),
                            report,
                        );
                    }
                    check_nodes(&option.body, location, catalog, report);
                }
            }
        }
    }
}

fn check_condition(expr: &str, location: &str, report: &mut LintReport) {
    if let Err(e) = Condition::parse(expr) {
        report.errors.push(format!("{}: {}", location, e));
    }
}

fn check_entry(entry: &VariableEntry, catalog: &VariableCatalog, report: &mut LintReport) {
    let name = entry.name.as_str();

    if entry.values.len() < 2 {
        report.warnings.push(format!(
            "Variable '{}' has only {} value(s) (at least 2 recommended)",
            name,
            entry.values.len()
        ));
    }

    if !entry.values.is_empty() && entry.values.iter().all(|v| v.condition.is_some()) {
        report.warnings.push(format!(
            "Variable '{}' has no unconditional value and may resolve to nothing",
            name
        ));
    }

    let mut self_referencing = 0;
    for (i, value) in entry.values.iter().enumerate() {
        let location = format!("Variable '{}' value #{}", name, i);

        if let Some(expr) = &value.condition {
            check_condition(expr, &location, report);
        }

        if !(value.text.contains("{{") || value.text.contains("[[")) {
            continue;
        }
        match Template::parse(&value.text) {
            Ok(fragment) => {
                check_nodes(&fragment.nodes, &location, catalog, report);
                if fragment.variable_names().contains(&name) {
                    self_referencing += 1;
                }
            }
            Err(e) => report.errors.push(format!("{}: {}", location, e)),
        }
    }

    if self_referencing > 0 && self_referencing == entry.values.len() {
        report.errors.push(format!(
            "Variable '{}' has no non-recursive value (infinite recursion)",
            name
        ));
    } else if self_referencing > 0 {
        report.warnings.push(format!(
            "Variable '{}' references itself in {} of {} values",
            name,
            self_referencing,
            entry.values.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::VariableValue;

    fn entry(name: &str, values: &[&str]) -> VariableEntry {
        VariableEntry::new(name, values.iter().map(|v| VariableValue::new(*v)).collect())
    }

    fn lint_str(template: &str, entries: Vec<VariableEntry>) -> LintReport {
        let template = Template::parse(template).unwrap();
        let catalog = VariableCatalog::from_entries(entries).unwrap();
        lint(&template, &catalog)
    }

    #[test]
    fn clean_template() {
        let report = lint_str(
            "A {{color}} door. {{#if level > 5}}It glows.{{/if}}",
            vec![entry("color", &["red", "blue"])],
        );
        assert!(report.is_clean(), "unexpected findings: {:?}", report);
    }

    #[test]
    fn unknown_variable_in_template() {
        let report = lint_str("{{ghost}}", vec![entry("color", &["red", "blue"])]);
        assert_eq!(report.errors, vec!["template references unknown variable 'ghost'"]);
    }

    #[test]
    fn unknown_variable_in_value() {
        let report = lint_str(
            "{{greeting}}",
            vec![entry("greeting", &["Hello, {{name}}.", "Hi."])],
        );
        assert_eq!(
            report.errors,
            vec!["Variable 'greeting' value #0 references unknown variable 'name'"]
        );
    }

    #[test]
    fn malformed_conditions_everywhere() {
        let template = "{{#if level >}}x{{/if}}[[options]][[option title=\"Run\" condition=\"== 3\"]]r[[/option]][[/options]]";
        let report = lint_str(
            template,
            vec![VariableEntry::new(
                "sky",
                vec![
                    VariableValue::new("grey").when("time_of_day ="),
                    VariableValue::new("blue"),
                ],
            )],
        );
        assert_eq!(report.errors.len(), 3, "errors: {:?}", report.errors);
        assert!(report.errors[0].starts_with("template: malformed condition 'level >'"));
        assert!(report.errors[1].starts_with("template option 'Run': malformed condition"));
        assert!(report.errors[2].starts_with("Variable 'sky' value #0: malformed condition"));
    }

    #[test]
    fn fully_recursive_variable_is_error() {
        let report = lint_str("{{echo}}", vec![entry("echo", &["x {{echo}}", "y {{echo}}"])]);
        assert_eq!(
            report.errors,
            vec!["Variable 'echo' has no non-recursive value (infinite recursion)"]
        );
    }

    #[test]
    fn partly_recursive_variable_is_warning() {
        let report = lint_str("{{chain}}", vec![entry("chain", &["link {{chain}}", "end"])]);
        assert!(report.errors.is_empty());
        assert_eq!(
            report.warnings,
            vec!["Variable 'chain' references itself in 1 of 2 values"]
        );
    }

    #[test]
    fn unparsable_value_is_error() {
        let report = lint_str("{{sale}}", vec![entry("sale", &["50% {{off", "full price"])]);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Variable 'sale' value #0: template parse error"));
    }

    #[test]
    fn variety_warnings() {
        let report = lint_str(
            "{{lonely}} {{gated}}",
            vec![
                entry("lonely", &["only"]),
                VariableEntry::new(
                    "gated",
                    vec![
                        VariableValue::new("moon").when("time_of_day == night"),
                        VariableValue::new("sun").when("time_of_day == day"),
                    ],
                ),
            ],
        );
        assert!(report.errors.is_empty());
        assert!(!report.has_errors());
        assert_eq!(
            report.warnings,
            vec![
                "Variable 'gated' has no unconditional value and may resolve to nothing",
                "Variable 'lonely' has only 1 value(s) (at least 2 recommended)",
            ]
        );
    }
}
