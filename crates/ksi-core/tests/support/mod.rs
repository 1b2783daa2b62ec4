// crates/ksi-core/tests/support/mod.rs
// ============================================================================
// Module: Test Support
// Description: Shared result helpers and signature fixtures for KSI tests.
// ============================================================================
//! ## Overview
//! Shared test helpers for consistent Result-based assertions, plus a fixture
//! builder that computes real SHA-256 aggregation and calendar chains, a
//! call-counting extender, and an Ed25519 calendar key.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    dead_code,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use ed25519_dalek::Signer;
use ed25519_dalek::SigningKey;
use ksi_core::AggregationHashChain;
use ksi_core::CalendarAuthenticationRecord;
use ksi_core::CalendarHashChain;
use ksi_core::CalendarLink;
use ksi_core::Certificate;
use ksi_core::CertificateRecord;
use ksi_core::ChainLink;
use ksi_core::DataHash;
use ksi_core::Extender;
use ksi_core::HashAlgorithm;
use ksi_core::InMemoryPublicationsHandler;
use ksi_core::KsiSignature;
use ksi_core::LinkMetadata;
use ksi_core::LinkSibling;
use ksi_core::MetadataFields;
use ksi_core::PolicyContext;
use ksi_core::ProtocolError;
use ksi_core::PublicKey;
use ksi_core::PublicationData;
use ksi_core::PublicationRecord;
use ksi_core::PublicationsFile;
use ksi_core::ResultCode;
use ksi_core::SignatureData;
use ksi_core::TrustAnchor;
use ksi_core::VerificationContext;
use ksi_core::VerificationErrorCode;
use ksi_core::VerificationInput;
use ksi_core::VerificationResult;
use ksi_core::core::certificate::ED25519_SIGNATURE_TYPE;
use ksi_core::core::hashing::hash_parts;

// ========================================================================
// Test Result Helpers
// ========================================================================

/// Standard result type used across KSI integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn Error>>;

/// Lightweight error type for test assertions.
#[derive(Debug)]
struct TestError {
    /// Human-readable failure message.
    message: String,
}

impl TestError {
    /// Creates a new test error with the provided message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl Error for TestError {}

/// Returns an error when a test condition fails.
///
/// # Errors
/// Returns a `TestError` when the condition is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> TestResult {
    if condition { Ok(()) } else { Err(Box::new(TestError::new(message))) }
}

/// Checks the final result code, error code, and deciding rule of a result.
///
/// # Errors
/// Returns a `TestError` describing the first mismatch.
pub fn ensure_result(
    result: &VerificationResult,
    code: ResultCode,
    error: Option<VerificationErrorCode>,
    rule_name: &str,
) -> TestResult {
    ensure(
        result.result_code() == code,
        format!("expected {code:?}, got {:?} from {}", result.result_code(), result.rule_name()),
    )?;
    ensure(
        result.error_code() == error,
        format!("expected error {error:?}, got {:?} from {}", result.error_code(), result.rule_name()),
    )?;
    ensure(
        result.rule_name() == rule_name,
        format!("expected rule {rule_name}, got {}", result.rule_name()),
    )
}

// ========================================================================
// Times and Identifiers
// ========================================================================

/// Signing time used by every fixture.
pub const AGGREGATION_TIME: u64 = 1_600_000_000;
/// Publication time of the fixture calendar chain.
pub const PUBLICATION_TIME: u64 = 1_600_086_400;
/// A publication after [`PUBLICATION_TIME`].
pub const LATER_PUBLICATION_TIME: u64 = 1_602_000_000;
/// Calendar head returned by the extender for open-ended requests.
pub const HEAD_TIME: u64 = 1_603_000_000;
/// Identifier of the calendar signing certificate.
pub const CERTIFICATE_ID: &[u8] = b"calendar-key-1";

// ========================================================================
// Hash Helpers
// ========================================================================

/// SHA-256 of `bytes`.
pub fn sha256(bytes: &[u8]) -> DataHash {
    hash_parts(HashAlgorithm::Sha256, &[bytes]).unwrap()
}

/// A SHA-1 imprint (not computable, only comparable).
pub fn sha1_imprint(byte: u8) -> DataHash {
    DataHash::new(HashAlgorithm::Sha1, vec![byte; 20]).unwrap()
}

/// Index element implied by `links`.
pub fn shape_index(links: &[ChainLink]) -> u64 {
    AggregationHashChain::new(0, vec![1], sha256(b"probe"), HashAlgorithm::Sha256, links.to_vec())
        .unwrap()
        .index_from_shape()
}

/// Builds an aggregation chain whose last index element matches its shape.
pub fn aggregation_chain(
    aggregation_time: u64,
    index_prefix: &[u64],
    input: DataHash,
    algorithm: HashAlgorithm,
    links: Vec<ChainLink>,
) -> AggregationHashChain {
    let mut index = index_prefix.to_vec();
    index.push(shape_index(&links));
    AggregationHashChain::new(aggregation_time, index, input, algorithm, links).unwrap()
}

/// Builds a calendar chain from round `aggregation_time` to `publication_time`.
///
/// Right siblings depend only on the subtree they cover, so they are the same
/// for every publication time; left siblings depend on the publication time.
pub fn calendar_chain(input: &DataHash, aggregation_time: u64, publication_time: u64) -> CalendarHashChain {
    let mut links = Vec::new();
    let mut remaining = publication_time;
    let mut time = 0_u64;
    while remaining > 0 {
        let high = 1_u64 << (63 - remaining.leading_zeros());
        if aggregation_time >= time + high {
            let (start, size) = (time.to_be_bytes(), high.to_be_bytes());
            let parts: [&[u8]; 3] = [b"right".as_slice(), start.as_slice(), size.as_slice()];
            links.push(CalendarLink::Right(sha256(&parts.concat())));
            time += high;
            remaining -= high;
        } else {
            let (publication, start) = (publication_time.to_be_bytes(), (time + high).to_be_bytes());
            let parts: [&[u8]; 3] = [b"left".as_slice(), publication.as_slice(), start.as_slice()];
            links.push(CalendarLink::Left(sha256(&parts.concat())));
            remaining = high - 1;
        }
    }
    links.reverse();
    CalendarHashChain::new(publication_time, aggregation_time, input.clone(), links)
}

// ========================================================================
// Signature Fixture
// ========================================================================

/// Aggregation chains over a fixed document, plus the calendar signing key.
pub struct Fixture {
    /// Document hash the first chain starts from.
    pub document: DataHash,
    /// Aggregation chains, document first.
    pub chains: Vec<AggregationHashChain>,
    /// Output of the last aggregation chain.
    pub root: DataHash,
    /// Calendar signing key.
    pub signing_key: SigningKey,
}

impl Fixture {
    /// Standard fixture: an imprint and a padded metadata link, then one more
    /// imprint link in the upper chain.
    pub fn new() -> Self {
        Self::with_links(standard_first_links(), standard_second_links())
    }

    /// Fixture built from custom links, all hashed with SHA-256.
    pub fn with_links(first_links: Vec<ChainLink>, second_links: Vec<ChainLink>) -> Self {
        let document = sha256(b"document");
        Self::from_input(document.clone(), document, first_links, second_links)
    }

    /// Fixture whose first chain starts from `first_input` instead of the
    /// document hash.
    pub fn from_input(
        document: DataHash,
        first_input: DataHash,
        first_links: Vec<ChainLink>,
        second_links: Vec<ChainLink>,
    ) -> Self {
        let second_index = shape_index(&second_links);
        let first = aggregation_chain(
            AGGREGATION_TIME,
            &[second_index],
            first_input,
            HashAlgorithm::Sha256,
            first_links,
        );
        let first_result = first.calculate_output_hash(0).unwrap();
        let second = aggregation_chain(
            AGGREGATION_TIME,
            &[],
            first_result.output_hash,
            HashAlgorithm::Sha256,
            second_links,
        );
        let root = second.calculate_output_hash(first_result.level).unwrap().output_hash;
        Self {
            document,
            chains: vec![first, second],
            root,
            signing_key: SigningKey::from_bytes(&[7; 32]),
        }
    }

    /// Calendar chain from the signing round to `publication_time`.
    pub fn calendar(&self, publication_time: u64) -> CalendarHashChain {
        calendar_chain(&self.root, AGGREGATION_TIME, publication_time)
    }

    /// Publication data committing to the calendar at `publication_time`.
    pub fn publication(&self, publication_time: u64) -> PublicationData {
        self.calendar(publication_time).publication_data().unwrap()
    }

    /// Signature without calendar chain or anchor.
    pub fn bare(&self) -> KsiSignature {
        KsiSignature::new(self.chains.clone(), None, None, None).unwrap()
    }

    /// Signature with a calendar chain and no anchor.
    pub fn with_calendar(&self) -> KsiSignature {
        KsiSignature::new(self.chains.clone(), Some(self.calendar(PUBLICATION_TIME)), None, None)
            .unwrap()
    }

    /// Signature anchored by a signed calendar authentication record.
    pub fn key_based(&self) -> KsiSignature {
        let calendar = self.calendar(PUBLICATION_TIME);
        let record = self.auth_record(calendar.publication_data().unwrap());
        KsiSignature::new(
            self.chains.clone(),
            Some(calendar),
            Some(TrustAnchor::CalendarAuthentication(record)),
            None,
        )
        .unwrap()
    }

    /// Authentication record over `publication_data` signed with the fixture key.
    pub fn auth_record(&self, publication_data: PublicationData) -> CalendarAuthenticationRecord {
        let message = publication_data.signed_bytes().unwrap();
        let signature_value = self.signing_key.sign(&message).to_bytes().to_vec();
        CalendarAuthenticationRecord {
            publication_data,
            signature_data: SignatureData {
                signature_type: ED25519_SIGNATURE_TYPE.to_string(),
                signature_value,
                certificate_id: CERTIFICATE_ID.to_vec(),
            },
        }
    }

    /// Signature anchored to the publication at `publication_time`.
    pub fn published(&self, publication_time: u64) -> KsiSignature {
        let calendar = self.calendar(publication_time);
        let record = PublicationRecord::new(calendar.publication_data().unwrap());
        KsiSignature::new(
            self.chains.clone(),
            Some(calendar),
            Some(TrustAnchor::Publication(record)),
            None,
        )
        .unwrap()
    }

    /// Signature with the given calendar chain and anchor.
    pub fn signature(&self, calendar: Option<CalendarHashChain>, anchor: Option<TrustAnchor>) -> KsiSignature {
        KsiSignature::new(self.chains.clone(), calendar, anchor, None).unwrap()
    }

    /// Certificate record for the fixture key, valid around the signing time.
    pub fn certificate(&self) -> CertificateRecord {
        CertificateRecord::new(CERTIFICATE_ID.to_vec(), Certificate {
            subject: "calendar".to_string(),
            key: PublicKey::Ed25519(self.signing_key.verifying_key().to_bytes()),
            not_before: AGGREGATION_TIME - 86_400,
            not_after: AGGREGATION_TIME + 365 * 86_400,
        })
    }

    /// Publications file holding the calendar roots at `times` and the
    /// fixture certificate.
    pub fn publications_file(&self, times: &[u64]) -> PublicationsFile {
        let publications =
            times.iter().map(|time| PublicationRecord::new(self.publication(*time))).collect();
        PublicationsFile::new(publications, vec![self.certificate()])
    }

    /// In-memory handler serving [`Fixture::publications_file`].
    pub fn handler(&self, times: &[u64]) -> Arc<InMemoryPublicationsHandler> {
        Arc::new(InMemoryPublicationsHandler::new(self.publications_file(times)))
    }

    /// Extender answering with honest chains over the fixture root.
    pub fn extender(&self) -> Arc<CountingExtender> {
        Arc::new(CountingExtender::new(self.root.clone(), Tamper::None))
    }

    /// Extender answering with altered chains.
    pub fn tampered_extender(&self, tamper: Tamper) -> Arc<CountingExtender> {
        Arc::new(CountingExtender::new(self.root.clone(), tamper))
    }
}

/// Lower chain links of the standard fixture.
pub fn standard_first_links() -> Vec<ChainLink> {
    vec![
        ChainLink::left(LinkSibling::Imprint(sha256(b"sibling-a"))),
        ChainLink::right(LinkSibling::Metadata(standard_metadata())),
    ]
}

/// Upper chain links of the standard fixture.
pub fn standard_second_links() -> Vec<ChainLink> {
    vec![ChainLink::right(LinkSibling::Imprint(sha256(b"sibling-b")))]
}

/// Padded client metadata.
pub fn standard_metadata() -> LinkMetadata {
    LinkMetadata::padded(&MetadataFields {
        client_id: "client-1".to_string(),
        machine_id: Some("machine-7".to_string()),
        sequence_number: Some(42),
        request_time: Some(AGGREGATION_TIME),
    })
    .unwrap()
}

/// Context over `signature` with the given inputs and collaborators.
pub fn context(
    signature: KsiSignature,
    input: VerificationInput,
    collaborators: PolicyContext,
) -> VerificationContext {
    VerificationContext::new(signature, input, collaborators)
}

// ========================================================================
// Extender Stand-Ins
// ========================================================================

/// Alteration applied to extender responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tamper {
    /// Honest responses.
    None,
    /// Response starts from a different input hash.
    InputHash,
    /// Response claims a different aggregation time.
    AggregationTime,
    /// Response is missing its first right link.
    DropRightLink,
    /// Response carries an additional right link at the root end.
    ExtraRightLink,
}

/// Extender computing chains locally and counting calls.
pub struct CountingExtender {
    /// Aggregation root every chain starts from.
    root: DataHash,
    /// Alteration applied to responses.
    tamper: Tamper,
    /// Number of `extend` calls.
    calls: AtomicUsize,
    /// Requested publication times in call order.
    requests: std::sync::Mutex<Vec<Option<u64>>>,
}

impl CountingExtender {
    /// Creates an extender.
    pub fn new(root: DataHash, tamper: Tamper) -> Self {
        Self {
            root,
            tamper,
            calls: AtomicUsize::new(0),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requested publication times in call order.
    pub fn requests(&self) -> Vec<Option<u64>> {
        self.requests.lock().unwrap().clone()
    }
}

impl Extender for CountingExtender {
    fn extend(
        &self,
        aggregation_time: u64,
        publication_time: Option<u64>,
    ) -> Result<CalendarHashChain, ProtocolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(publication_time);
        let target = publication_time.unwrap_or(HEAD_TIME);
        let chain = calendar_chain(&self.root, aggregation_time, target);
        let mut links = chain.links().to_vec();
        let (time, input) = match self.tamper {
            Tamper::None => (aggregation_time, self.root.clone()),
            Tamper::InputHash => (aggregation_time, sha256(b"someone else")),
            Tamper::AggregationTime => (aggregation_time + 1, self.root.clone()),
            Tamper::DropRightLink => {
                if let Some(position) = links.iter().position(CalendarLink::is_right) {
                    links.remove(position);
                }
                (aggregation_time, self.root.clone())
            }
            Tamper::ExtraRightLink => {
                links.push(CalendarLink::Right(sha256(b"extra")));
                (aggregation_time, self.root.clone())
            }
        };
        Ok(CalendarHashChain::new(target, time, input, links))
    }
}

/// Extender that is always unreachable.
pub struct OfflineExtender;

impl Extender for OfflineExtender {
    fn extend(&self, _: u64, _: Option<u64>) -> Result<CalendarHashChain, ProtocolError> {
        Err(ProtocolError::Unavailable("extender offline".to_string()))
    }
}
