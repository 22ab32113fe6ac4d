pub mod context;
pub mod diff;
pub mod dispatch;
pub mod feedback;
pub mod path;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod version;

pub use context::RunContext;
pub use dispatch::{DispatchOptions, FetchOutcome, dispatch};
pub use feedback::Feedback;
pub use path::{
    Candidate, Discovery, DiscoveryError, FilterOptions, PathFilter, WalkErrorPolicy, discover,
    logical_name, walked_path,
};
pub use pipeline::{VerifyError, VerifyOptions, VerifyRun, run};
pub use report::{MismatchCause, Report, Verdict, compare_outcome, report_all};
pub use source::{RemoteSource, SourceError, VersionRecord};
pub use version::{RemoteVersion, ResolvedVersion, VersionError, resolve};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
