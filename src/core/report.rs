//! Whole-hierarchy checks and their rendering.

use crate::core::error::{AbstractError, MissingMethods};
use crate::core::gate::CreateOp;
use crate::core::hierarchy::TypeKind;
use crate::core::runtime::Runtime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Instantiable,
    /// Declares abstract methods itself; never instantiable.
    Abstract { message: String },
    NotImplemented { missing: Vec<MissingMethods> },
    /// Modules are not instantiated.
    Skipped,
}

impl Verdict {
    pub fn is_failure(&self) -> bool {
        matches!(self, Verdict::NotImplemented { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeReport {
    pub name: String,
    pub kind: TypeKind,
    pub participates: bool,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub types: Vec<TypeReport>,
    pub instantiable: usize,
    pub abstract_types: usize,
    pub failures: usize,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.failures == 0
    }
}

/// Attempt `new` on every registered class. Classes that still declare
/// abstract methods themselves are reported as abstract without being
/// checked against their ancestors.
pub fn check_all(runtime: &Runtime) -> Result<CheckReport, AbstractError> {
    let mut types = Vec::new();
    for ty in runtime.types()? {
        let kind = runtime.kind(ty)?;
        let verdict = if kind == TypeKind::Module {
            Verdict::Skipped
        } else if !runtime.abstract_methods(ty, false)?.is_empty() {
            Verdict::Abstract {
                message: AbstractError::WrongOperation {
                    target: runtime.describe(ty.instance())?,
                    op: CreateOp::New.to_string(),
                }
                .to_string(),
            }
        } else {
            match runtime.new_instance(ty) {
                Ok(_) => Verdict::Instantiable,
                Err(err @ AbstractError::WrongOperation { .. }) => Verdict::Abstract {
                    message: err.to_string(),
                },
                Err(err) => match err.missing() {
                    Some(missing) => Verdict::NotImplemented {
                        missing: missing.to_vec(),
                    },
                    None => return Err(err),
                },
            }
        };
        types.push(TypeReport {
            name: runtime.describe(ty.instance())?,
            kind,
            participates: runtime.participates(ty.instance())?,
            verdict,
        });
    }

    let count = |pred: fn(&Verdict) -> bool| types.iter().filter(|t| pred(&t.verdict)).count();
    let instantiable = count(|v| matches!(v, Verdict::Instantiable));
    let abstract_types = count(|v| matches!(v, Verdict::Abstract { .. }));
    let failures = count(Verdict::is_failure);
    Ok(CheckReport {
        types,
        instantiable,
        abstract_types,
        failures,
    })
}

pub fn render_text(report: &CheckReport) -> String {
    use colored::Colorize;

    let mut lines = Vec::new();
    for t in &report.types {
        match &t.verdict {
            Verdict::Instantiable => {
                lines.push(format!("{} {}", "✓".bright_green(), t.name));
            }
            Verdict::Abstract { .. } => {
                lines.push(format!("{} {} (abstract)", "▸".bright_cyan(), t.name));
            }
            Verdict::Skipped => {
                lines.push(format!("{} {} (module)", "·".dimmed(), t.name));
            }
            Verdict::NotImplemented { missing } => {
                lines.push(format!("{} {}", "✗".bright_red(), t.name.bold()));
                for m in missing {
                    lines.push(format!(
                        "    [{}] defined in {}",
                        m.methods.join(", "),
                        m.owner
                    ));
                }
            }
        }
    }
    lines.push(String::new());
    let summary = format!(
        "{} instantiable, {} abstract, {} failing",
        report.instantiable, report.abstract_types, report.failures
    );
    lines.push(if report.passed() {
        summary.bright_green().to_string()
    } else {
        summary.bright_red().to_string()
    });
    lines.join("\n")
}
