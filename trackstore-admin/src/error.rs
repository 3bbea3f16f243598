use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use trackstore_merge::MergeFailure;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for admin operations.
pub type AdminResult<T> = Result<T, AdminError>;

/// Captured backtrace wrapper to avoid thiserror's unstable feature detection.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two stores an error relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    Master,
    Slave,
}

impl fmt::Display for StoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreRole::Master => f.write_str("master"),
            StoreRole::Slave => f.write_str("slave"),
        }
    }
}

/// Error type for the admin binary.
#[derive(Debug)]
pub enum AdminError {
    /// The merge stopped at a stage and table.
    Merge(MergeFailure),
    /// Configuration error.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// A store could not be reached.
    Connect(StoreRole, sqlx::Error, CapturedBacktrace),
    /// I/O error.
    Io(std::io::Error, CapturedBacktrace),
}

impl AdminError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            AdminError::Merge(failure) => failure.source.category(),
            AdminError::Config(_, _) => "configuration error",
            AdminError::Connect(_, _, _) => "connection error",
            AdminError::Io(_, _) => "i/o error",
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            AdminError::Merge(_) => None,
            AdminError::Config(_, cb) => Some(&cb.0),
            AdminError::Connect(_, _, cb) => Some(&cb.0),
            AdminError::Io(_, cb) => Some(&cb.0),
        }
    }

    /// Creates a configuration error from any source.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        AdminError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a closure turning a connection failure into an error for the given store.
    pub fn connect(role: StoreRole) -> impl FnOnce(sqlx::Error) -> Self {
        move |err| AdminError::Connect(role, err, CapturedBacktrace::capture())
    }

    /// Returns a report of the error for terminal output.
    ///
    /// Merge failures name the stage and table in progress so the operator can fix the data and
    /// run the merge again.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("merge admin failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        if let AdminError::Merge(failure) = self {
            out.push_str(&format!("stage: {}\n", failure.stage));
            if let Some(table) = &failure.table {
                out.push_str(&format!("table: {table}\n"));
            }
        }

        let mut source = Error::source(self);
        let mut idx = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {idx}: {err}\n"));
            source = err.source();
            idx += 1;
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::Merge(failure) => write!(f, "{failure}"),
            AdminError::Config(source, _) => write!(f, "configuration error: {source}"),
            AdminError::Connect(role, source, _) => {
                write!(f, "could not connect to the {role} store: {source}")
            }
            AdminError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for AdminError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            // The failure message already contains its source, start the chain one level down.
            AdminError::Merge(failure) => failure.source.source(),
            AdminError::Config(source, _) => Some(source.as_ref()),
            AdminError::Connect(_, source, _) => Some(source),
            AdminError::Io(source, _) => Some(source),
        }
    }
}

impl From<MergeFailure> for AdminError {
    fn from(failure: MergeFailure) -> Self {
        AdminError::Merge(failure)
    }
}

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        AdminError::Io(err, CapturedBacktrace::capture())
    }
}
