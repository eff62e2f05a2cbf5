//! Diagnostics of one compilation run
//!
//! Every stage of the analysis gets a `&mut Diagnostics`. Reports are collected in
//! order, counted per severity, and forwarded to the `log` facade.

use crate::OilError;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Information,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    const fn index(self) -> usize {
        match self {
            Self::Information => 0,
            Self::Warning => 1,
            Self::Error => 2,
            Self::Fatal => 3,
        }
    }

    const fn prefix(self) -> &'static str {
        match self {
            Self::Information => "I",
            Self::Warning => "W",
            Self::Error => "E",
            Self::Fatal => "F",
        }
    }

    const fn log_level(self) -> log::Level {
        match self {
            Self::Information => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error | Self::Fatal => log::Level::Error,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Information => f.write_str("INFORMATION"),
            Self::Warning => f.write_str("WARNING"),
            Self::Error => f.write_str("ERROR"),
            Self::Fatal => f.write_str("FATAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: Option<u32>,
    pub filename: Option<String>,
    /// severity prefix and error code, e.g. `E-UNDEFINED-RESOURCE`
    pub code: String,
    /// the error this diagnostic was created from, if any
    pub error: Option<OilError>,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.filename, self.line) {
            (Some(filename), Some(line)) => write!(f, "{filename}:{line}: ")?,
            (Some(filename), None) => write!(f, "{filename}: ")?,
            _ => {}
        }
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    filename: Option<String>,
    strict: bool,
    messages: Vec<Diagnostic>,
    counters: [usize; 4],
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// diagnostics for a run on the named source file
    #[must_use]
    pub fn for_file(filename: &str) -> Self {
        Self {
            filename: Some(filename.to_string()),
            ..Self::default()
        }
    }

    /// in strict mode warnings are reported as errors
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// report a free-form message
    pub fn report(&mut self, severity: Severity, message: &str, line: Option<u32>, code: &str) {
        self.push(Diagnostic {
            severity,
            message: message.to_string(),
            line,
            filename: self.filename.clone(),
            code: format!("{}-{code}", severity.prefix()),
            error: None,
        });
    }

    /// record a fatal error and hand it back for propagation
    pub fn fatal(&mut self, error: OilError) -> OilError {
        self.report_error(Severity::Fatal, error.clone());
        error
    }

    pub fn error(&mut self, error: OilError) {
        self.report_error(Severity::Error, error);
    }

    pub fn warning(&mut self, error: OilError) {
        let severity = if self.strict {
            Severity::Error
        } else {
            Severity::Warning
        };
        self.report_error(severity, error);
    }

    pub fn information(&mut self, message: &str) {
        self.report(Severity::Information, message, None, "INFO");
    }

    fn report_error(&mut self, severity: Severity, error: OilError) {
        self.push(Diagnostic {
            severity,
            message: error.to_string(),
            line: error.line(),
            filename: self.filename.clone(),
            code: format!("{}-{}", severity.prefix(), error.code()),
            error: Some(error),
        });
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        log::log!(diagnostic.severity.log_level(), "{diagnostic}");
        self.counters[diagnostic.severity.index()] += 1;
        self.messages.push(diagnostic);
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.counters[severity.index()]
    }

    /// all diagnostics in the order they were reported
    #[must_use]
    pub fn messages(&self) -> &[Diagnostic] {
        &self.messages
    }

    /// the errors that were reported, at any severity
    pub fn errors(&self) -> impl Iterator<Item = &OilError> {
        self.messages.iter().filter_map(|diag| diag.error.as_ref())
    }

    /// false if anything at severity ERROR or FATAL was reported; code generation must be skipped then
    #[must_use]
    pub fn may_generate(&self) -> bool {
        self.count(Severity::Error) == 0 && self.count(Severity::Fatal) == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn undefined(resource: &str) -> OilError {
        OilError::UndefinedResourceReference {
            task: "t1".to_string(),
            resource: resource.to_string(),
        }
    }

    #[test]
    fn counters() {
        let mut diag = Diagnostics::new();
        assert!(diag.may_generate());

        diag.information("starting");
        diag.warning(OilError::UnresolvedAuto {
            object_type: "TASK".to_string(),
            name: "t1".to_string(),
            attribute: "STACKSIZE".to_string(),
        });
        assert_eq!(diag.count(Severity::Information), 1);
        assert_eq!(diag.count(Severity::Warning), 1);
        assert!(diag.may_generate());

        diag.error(undefined("r1"));
        diag.error(undefined("r2"));
        assert_eq!(diag.count(Severity::Error), 2);
        assert!(!diag.may_generate());

        let returned = diag.fatal(undefined("r3"));
        assert_eq!(returned, undefined("r3"));
        assert_eq!(diag.count(Severity::Fatal), 1);
        assert_eq!(diag.messages().len(), 5);
        assert_eq!(diag.errors().count(), 4);
    }

    #[test]
    fn strict_promotes_warnings() {
        let mut diag = Diagnostics::new();
        diag.set_strict(true);
        diag.warning(OilError::UnresolvedAuto {
            object_type: "EVENT".to_string(),
            name: "ev".to_string(),
            attribute: "MASK".to_string(),
        });
        assert_eq!(diag.count(Severity::Warning), 0);
        assert_eq!(diag.count(Severity::Error), 1);
        assert!(!diag.may_generate());
    }

    #[test]
    fn formatting() {
        let mut diag = Diagnostics::for_file("app.oil");
        diag.error(undefined("r1"));
        diag.report(Severity::Warning, "something odd", Some(12), "ODD");
        let texts: Vec<String> = diag.messages().iter().map(ToString::to_string).collect();
        assert_eq!(
            texts[0],
            "app.oil: [E-UNDEFINED-RESOURCE] Undefined resource reference: TASK t1 uses RESOURCE r1, which is not declared"
        );
        assert_eq!(texts[1], "app.oil:12: [W-ODD] something odd");

        let mut diag = Diagnostics::new();
        diag.information("hello");
        assert_eq!(diag.messages()[0].to_string(), "[I-INFO] hello");
    }
}
