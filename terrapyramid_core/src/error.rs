//! Uniform error kinds surfaced by the pipeline core (spec §7).

use std::fmt;

/// The named failure categories the core distinguishes. Carried inside an [`anyhow::Error`]
/// chain so callers that need to special-case a kind (in particular the Scheduler's
/// `Interrupted` short-circuit) can `downcast_ref::<PipelineError>()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	InvalidArgument,
	PlanInvalid,
	SourceMissing,
	WarpFailed,
	TranslateFailed,
	MergeFailed,
	EncodeFailed,
	DependencyNotReady,
	OrderViolation,
	Duplicate,
	IoError,
	Interrupted,
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			ErrorKind::InvalidArgument => "InvalidArgument",
			ErrorKind::PlanInvalid => "PlanInvalid",
			ErrorKind::SourceMissing => "SourceMissing",
			ErrorKind::WarpFailed => "WarpFailed",
			ErrorKind::TranslateFailed => "TranslateFailed",
			ErrorKind::MergeFailed => "MergeFailed",
			ErrorKind::EncodeFailed => "EncodeFailed",
			ErrorKind::DependencyNotReady => "DependencyNotReady",
			ErrorKind::OrderViolation => "OrderViolation",
			ErrorKind::Duplicate => "Duplicate",
			ErrorKind::IoError => "IOError",
			ErrorKind::Interrupted => "Interrupted",
		};
		f.write_str(name)
	}
}

/// A typed pipeline error, carrying one of the [`ErrorKind`]s plus a human-readable message.
#[derive(Debug, Clone)]
pub struct PipelineError {
	pub kind: ErrorKind,
	pub message: String,
}

impl PipelineError {
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into() }
	}

	/// True for the one kind the Scheduler does not treat as a unit failure.
	pub fn is_interrupted(&self) -> bool {
		self.kind == ErrorKind::Interrupted
	}
}

impl fmt::Display for PipelineError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.kind, self.message)
	}
}

impl std::error::Error for PipelineError {}

/// Inspects an [`anyhow::Error`] chain for a [`PipelineError`] of kind [`ErrorKind::Interrupted`].
pub fn is_interrupted(err: &anyhow::Error) -> bool {
	err.downcast_ref::<PipelineError>().is_some_and(PipelineError::is_interrupted)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn downcast_recovers_kind() {
		let err: anyhow::Error = PipelineError::new(ErrorKind::Interrupted, "sigint").into();
		assert!(is_interrupted(&err));

		let err: anyhow::Error = PipelineError::new(ErrorKind::MergeFailed, "boom").into();
		assert!(!is_interrupted(&err));
	}

	#[test]
	fn display_includes_kind_and_message() {
		let err = PipelineError::new(ErrorKind::PlanInvalid, "missing column 'maxzoom'");
		assert_eq!(err.to_string(), "PlanInvalid: missing column 'maxzoom'");
	}
}
