//! This crate provides the Dalvik bytecode method verifier for the
//! `DexVerify` project.
//!
//! Given a decoded method (from `dv_dex`) and a class hierarchy, the
//! verifier computes the abstract register types holding before and after
//! every instruction and validates every instruction's operands against the
//! Dalvik type system.

pub mod classpath;
pub mod errors;
pub mod regtype;
pub mod verifier;

use crate::classpath::ClassPath;
use crate::errors::AnalysisResult;
use crate::verifier::{MethodAnalyzer, Verification};
use dv_dex::methods::EncodedMethod;

/// Verifies a single method against the given class hierarchy.
///
/// # Errors
///
/// Returns a validation error for semantically invalid bytecode, and a
/// resolution error when a referenced descriptor is unknown to the
/// classpath.
pub fn verify_method(
    method: &EncodedMethod,
    classpath: &ClassPath,
) -> AnalysisResult<Verification> {
    MethodAnalyzer::new(method, classpath)?.analyze()
}
