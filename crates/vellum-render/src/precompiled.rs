//! Precompiled template artifacts.
//!
//! A theme build step can precompile every template once (see
//! [`PreProcessor`](crate::PreProcessor)) and ship the serialized artifacts
//! instead of raw sources. The artifact is JSON with a stable shape:
//!
//! ```text
//! {"compiler":[1,">= 0.3.0"],"main":{"type":"function","source":"Hi {{ name }}","digest":"…"}}
//! ```
//!
//! - `compiler`: `[revision, version requirement]` of the compiler that produced it
//! - `main`: the entry point, tagged `function`, with the checked template body
//!   and its SHA-256 digest
//!
//! # Detection
//!
//! [`classify`] decides whether a payload handed to
//! [`Renderer::add_templates`](crate::Renderer::add_templates) is raw source
//! or an artifact. A cheap structural pre-check ([`looks_precompiled`]) lets
//! ordinary templates through untouched; only payloads that carry the
//! artifact signature are deserialized. The pre-check is a short-circuit, not
//! a trust boundary: artifacts are parsed into [`PrecompiledArtifact`] with
//! serde and validated ([`PrecompiledArtifact::verify`]) before the engine
//! attaches behavior to them. Nothing in the payload is ever evaluated.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{Error, Result};

/// Revision of the artifact layout produced by this crate.
pub const COMPILER_REVISION: u32 = 1;

/// Runtime versions able to execute artifacts of [`COMPILER_REVISION`].
pub const COMPILER_VERSION: &str = ">= 0.3.0";

static SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)"compiler"\s*:\s*\[[^\]]*\].*?"main"\s*:\s*\{.*?"type"\s*:\s*"function""#,
    )
    .expect("artifact signature regex is valid")
});

/// `[revision, version requirement]` of the producing compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerInfo(pub u32, pub String);

impl CompilerInfo {
    pub fn current() -> Self {
        Self(COMPILER_REVISION, COMPILER_VERSION.to_string())
    }

    pub fn revision(&self) -> u32 {
        self.0
    }

    pub fn version(&self) -> &str {
        &self.1
    }
}

/// Entry point of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MainEntry {
    Function { source: String, digest: String },
}

/// A serialized, previously compiled template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecompiledArtifact {
    pub compiler: CompilerInfo,
    pub main: MainEntry,
}

impl PrecompiledArtifact {
    /// Builds an artifact for an already validated template body.
    pub fn new(source: &str) -> Self {
        Self {
            compiler: CompilerInfo::current(),
            main: MainEntry::Function {
                source: source.to_string(),
                digest: digest(source),
            },
        }
    }

    /// Deserializes an artifact from its JSON form.
    pub fn parse(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|err| {
            Error::format(format!("malformed precompiled template: {}", err)).with_source(err)
        })
    }

    /// Serializes the artifact to its JSON form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| {
            Error::compile(format!("failed to serialize precompiled template: {}", err))
                .with_source(err)
        })
    }

    /// The template body carried by the entry point.
    pub fn source(&self) -> &str {
        match &self.main {
            MainEntry::Function { source, .. } => source,
        }
    }

    /// Checks revision compatibility and body integrity.
    pub fn verify(&self) -> Result<()> {
        let revision = self.compiler.revision();
        if revision != COMPILER_REVISION {
            let message = if revision < COMPILER_REVISION {
                format!(
                    "template was precompiled with an older compiler (revision {}, {}) than the runtime (revision {}, {}); precompile it again",
                    revision,
                    self.compiler.version(),
                    COMPILER_REVISION,
                    COMPILER_VERSION
                )
            } else {
                format!(
                    "template was precompiled with a newer compiler (revision {}, {}) than the runtime (revision {}, {}); upgrade the runtime",
                    revision,
                    self.compiler.version(),
                    COMPILER_REVISION,
                    COMPILER_VERSION
                )
            };
            return Err(Error::format(message)
                .with_context("revision", revision.to_string())
                .with_context("expected_revision", COMPILER_REVISION.to_string()));
        }

        let MainEntry::Function { source, digest: expected } = &self.main;
        let actual = digest(source);
        if &actual != expected {
            warn!(%expected, %actual, "precompiled template digest mismatch");
            return Err(Error::format(
                "precompiled template digest does not match its body",
            ));
        }
        Ok(())
    }
}

/// A classified template payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Template source to be compiled by the engine.
    Raw(&'a str),
    /// A deserialized artifact, not yet verified.
    Precompiled(PrecompiledArtifact),
}

/// Structural pre-check: does `payload` carry the artifact signature?
pub fn looks_precompiled(payload: &str) -> bool {
    SIGNATURE.is_match(payload)
}

/// Classifies a payload as raw source or precompiled artifact.
///
/// Payloads without the artifact signature are returned unchanged as
/// [`Payload::Raw`]. Payloads with it must deserialize, otherwise a
/// format error is returned.
pub fn classify(payload: &str) -> Result<Payload<'_>> {
    if !looks_precompiled(payload) {
        return Ok(Payload::Raw(payload));
    }
    PrecompiledArtifact::parse(payload).map(Payload::Precompiled)
}

fn digest(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_artifact_json_shape() {
        let json = PrecompiledArtifact::new("Hi {{ name }}").to_json().unwrap();
        assert!(json.starts_with(r#"{"compiler":[1,">= 0.3.0"],"main":{"type":"function","#));
        assert!(looks_precompiled(&json));
    }

    #[test]
    fn test_parse_roundtrip() {
        let artifact = PrecompiledArtifact::new("{% if x %}y{% endif %}");
        let parsed = PrecompiledArtifact::parse(&artifact.to_json().unwrap()).unwrap();
        assert_eq!(parsed, artifact);
        assert!(parsed.verify().is_ok());
    }

    #[test]
    fn test_plain_template_is_raw() {
        assert_eq!(classify("Hello {{name}}").unwrap(), Payload::Raw("Hello {{name}}"));
    }

    #[test]
    fn test_signature_tolerates_whitespace_and_extra_keys() {
        let payload = r#"{
            "compiler" : [1, ">= 0.3.0"],
            "useData": true,
            "main" : { "type" : "function", "source": "x", "digest": "y" }
        }"#;
        assert!(looks_precompiled(payload));
    }

    #[test]
    fn test_signature_tolerates_reordered_main() {
        let payload = r#"{"compiler":[1,">= 0.3.0"],"main":{"digest":"d","source":"x","type":"function"}}"#;
        assert!(looks_precompiled(payload));
    }

    #[test]
    fn test_artifact_survives_json_normalization() {
        let json = PrecompiledArtifact::new("Hi {{ name }}").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        for normalized in [value.to_string(), serde_json::to_string_pretty(&value).unwrap()] {
            match classify(&normalized).unwrap() {
                Payload::Precompiled(artifact) => {
                    assert_eq!(artifact.source(), "Hi {{ name }}");
                    assert!(artifact.verify().is_ok());
                }
                Payload::Raw(_) => panic!("normalized artifact classified as raw"),
            }
        }
    }

    #[test]
    fn test_signature_requires_order() {
        let payload = r#"{"main":{"type":"function"},"compiler":[1,"x"]}"#;
        assert!(!looks_precompiled(payload));
    }

    #[test]
    fn test_signature_requires_function_main() {
        let payload = r#"{"compiler":[1,"x"],"main":"function"}"#;
        assert!(!looks_precompiled(payload));
    }

    #[test]
    fn test_signature_match_but_malformed_is_format_error() {
        let payload = r#"{"compiler":[1,">= 0.3.0"],"main":{"type":"function","source":"x"}"#;
        let err = classify(payload).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_older_revision_rejected() {
        let mut artifact = PrecompiledArtifact::new("x");
        artifact.compiler = CompilerInfo(0, ">= 0.1.0".into());
        let err = artifact.verify().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.message().contains("older compiler"));
        assert_eq!(err.context().get("revision").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_newer_revision_rejected() {
        let mut artifact = PrecompiledArtifact::new("x");
        artifact.compiler = CompilerInfo(COMPILER_REVISION + 1, ">= 9.0.0".into());
        let err = artifact.verify().unwrap_err();
        assert!(err.message().contains("newer compiler"));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let mut artifact = PrecompiledArtifact::new("{{ price }}");
        if let MainEntry::Function { source, .. } = &mut artifact.main {
            source.push_str("{{ secret }}");
        }
        let err = artifact.verify().unwrap_err();
        assert!(err.message().contains("digest"));
    }

    proptest! {
        #[test]
        fn prop_text_without_marker_is_raw(s in "[^\"]{0,64}") {
            prop_assert!(matches!(classify(&s), Ok(Payload::Raw(_))));
        }

        #[test]
        fn prop_artifacts_always_detected(s in ".{0,64}") {
            let json = PrecompiledArtifact::new(&s).to_json().unwrap();
            prop_assert!(looks_precompiled(&json));
            let restored = match classify(&json).unwrap() {
                Payload::Precompiled(artifact) => artifact,
                Payload::Raw(_) => unreachable!(),
            };
            prop_assert_eq!(restored.source(), s.as_str());
        }
    }
}
