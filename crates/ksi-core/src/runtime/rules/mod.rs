// crates/ksi-core/src/runtime/rules/mod.rs
// ============================================================================
// Module: Verification Rules
// Description: Closed set of leaf checks over a verification context.
// Purpose: Name every check and route evaluation to its rule family.
// Dependencies: crate::{core, runtime::context}, ksi-rule-logic
// ============================================================================

//! ## Overview
//! Every leaf check is a [`VerificationRule`] variant. Rules are pure over the
//! context except the extension and publications-file families, which reach
//! collaborators through the context's memoized accessors.
//!
//! Each rule guards its own precondition and returns `NA` with the
//! inconclusive code when it does not apply. Conjunctions keep evaluating past
//! `NA`, so a rule that would call a collaborator must never rely on an
//! earlier sibling to stop evaluation.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod aggregation;
pub mod auth_record;
pub mod calendar;
pub mod document;
pub mod extension;
pub mod legacy;
pub mod publication;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use ksi_rule_logic::LeafRule;
use ksi_rule_logic::Outcome;
use serde::Deserialize;
use serde::Serialize;

use crate::core::VerificationErrorCode;
use crate::runtime::context::VerificationContext;
use crate::runtime::context::VerificationError;

// ============================================================================
// SECTION: Shared Types
// ============================================================================

/// Result type returned by every rule body.
pub type RuleOutcome = Result<Outcome<VerificationErrorCode>, VerificationError>;

/// `NA` with the inconclusive code.
pub(crate) const INCONCLUSIVE: Outcome<VerificationErrorCode> =
    Outcome::Na(VerificationErrorCode::Inconclusive);

/// Publication an extension rule extends towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionTarget {
    /// First publications-file publication at or after the aggregation time.
    PublicationsFile,
    /// The caller-supplied publication.
    UserPublication,
    /// The signature calendar chain's publication time, or the calendar head
    /// when the signature has no calendar chain.
    CalendarChain,
}

// ============================================================================
// SECTION: Rule Set
// ============================================================================

/// Leaf verification checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationRule {
    /// OK when no document hash was supplied.
    DocumentHashDoesNotExist,
    /// Document hash algorithm equals the signature input algorithm.
    DocumentHashAlgorithm,
    /// Document hash equals the signature input hash.
    DocumentHashVerification,
    /// Caller level does not exceed the level the signature allows.
    DocumentHashLevel,
    /// Signature input hash algorithm not deprecated at signing time.
    InputHashAlgorithmDeprecated,

    /// OK when the signature has no legacy record.
    LegacyRecordDoesNotExist,
    /// Legacy record output equals the first chain input.
    LegacyRecordOutputHash,
    /// Legacy record time equals the first chain time.
    LegacyRecordAggregationTime,
    /// Legacy record index equals the first chain index.
    LegacyRecordChainIndex,
    /// Legacy record input algorithms not deprecated at signing time.
    LegacyRecordAlgorithmsDeprecated,
    /// Legacy record output algorithm not deprecated at signing time.
    LegacyRecordOutputAlgorithmDeprecated,

    /// Each chain output equals the next chain input.
    AggregationChainConsistency,
    /// All chains share one aggregation time.
    AggregationChainTimeConsistency,
    /// Chain indices form one unbroken path to the root.
    AggregationChainIndexSuccessor,
    /// Each chain's link shape matches its index.
    AggregationChainIndexConsistency,
    /// Metadata siblings cannot be mistaken for imprints.
    AggregationChainMetadata,
    /// No chain algorithm deprecated at signing time.
    AggregationChainAlgorithmDeprecated,

    /// OK when the signature has no calendar chain.
    CalendarHashChainDoesNotExist,
    /// OK when the signature has a calendar chain.
    CalendarHashChainExistence,
    /// Calendar input equals the last aggregation chain output.
    CalendarHashChainInputHash,
    /// Calendar aggregation time equals the signing time.
    CalendarHashChainAggregationTime,
    /// Calendar link shape yields the aggregation time.
    CalendarHashChainRegistrationTime,
    /// No calendar algorithm deprecated at publication time.
    CalendarHashChainAlgorithmDeprecated,

    /// OK when the signature has no calendar authentication record.
    CalendarAuthenticationRecordDoesNotExist,
    /// OK when the signature has a calendar authentication record.
    CalendarAuthenticationRecordExistence,
    /// Record time equals the calendar publication time.
    CalendarAuthenticationRecordPublicationTime,
    /// Record hash equals the calendar root.
    CalendarAuthenticationRecordAggregationHash,
    /// Signing certificate can be resolved.
    CertificateExistence,
    /// Signing certificate valid at signing time.
    CertificateValidity,
    /// Record signature verifies with the certificate.
    CalendarAuthenticationRecordSignature,

    /// OK when the signature has no publication record.
    SignaturePublicationRecordDoesNotExist,
    /// OK when the signature has a publication record.
    SignaturePublicationRecordExistence,
    /// Record time equals the calendar publication time.
    PublicationRecordPublicationTime,
    /// Record hash equals the calendar root.
    PublicationRecordPublicationHash,

    /// Publications file holds the signature's publication.
    PublicationsFileContainsSignaturePublication,
    /// Publications file has a publication after signing.
    PublicationsFileHasSuitablePublication,

    /// OK when the caller supplied a publication.
    UserProvidedPublicationExistence,
    /// Caller publication time equals the record time.
    UserProvidedPublicationTimeMatches,
    /// Caller publication hash equals the record hash.
    UserProvidedPublicationHashMatches,
    /// Caller publication is later than signing.
    UserProvidedPublicationCreationTime,

    /// OK when extending is allowed.
    ExtendingPermitted,
    /// Extended chain input equals the last aggregation chain output.
    ExtendedChainInputHash(ExtensionTarget),
    /// Extended chain aggregation time equals the signing time.
    ExtendedChainAggregationTime(ExtensionTarget),
    /// Extended chain root equals the target's hash.
    ExtendedChainRootHash(ExtensionTarget),
    /// Extended chain right links equal the signature's.
    ExtendedChainRightLinksMatch(ExtensionTarget),
}

impl VerificationRule {
    /// Returns the reported rule name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DocumentHashDoesNotExist => "DocumentHashDoesNotExistRule",
            Self::DocumentHashAlgorithm => "DocumentHashAlgorithmVerificationRule",
            Self::DocumentHashVerification => "DocumentHashVerificationRule",
            Self::DocumentHashLevel => "InputHashLevelVerificationRule",
            Self::InputHashAlgorithmDeprecated => "InputHashAlgorithmDeprecatedRule",
            Self::LegacyRecordDoesNotExist => "LegacyRecordDoesNotExistRule",
            Self::LegacyRecordOutputHash => "LegacyRecordOutputHashVerificationRule",
            Self::LegacyRecordAggregationTime => "LegacyRecordAggregationTimeRule",
            Self::LegacyRecordChainIndex => "LegacyRecordChainIndexRule",
            Self::LegacyRecordAlgorithmsDeprecated => "LegacyRecordAlgorithmsDeprecatedRule",
            Self::LegacyRecordOutputAlgorithmDeprecated => {
                "LegacyRecordOutputAlgorithmDeprecatedRule"
            }
            Self::AggregationChainConsistency => "AggregationHashChainConsistencyRule",
            Self::AggregationChainTimeConsistency => "AggregationHashChainTimeConsistencyRule",
            Self::AggregationChainIndexSuccessor => "AggregationHashChainIndexSuccessorRule",
            Self::AggregationChainIndexConsistency => "AggregationHashChainIndexConsistencyRule",
            Self::AggregationChainMetadata => "AggregationHashChainMetadataRule",
            Self::AggregationChainAlgorithmDeprecated => {
                "AggregationHashChainAlgorithmDeprecatedRule"
            }
            Self::CalendarHashChainDoesNotExist => "CalendarHashChainDoesNotExistRule",
            Self::CalendarHashChainExistence => "CalendarHashChainExistenceRule",
            Self::CalendarHashChainInputHash => "CalendarHashChainInputHashVerificationRule",
            Self::CalendarHashChainAggregationTime => "CalendarHashChainAggregationTimeRule",
            Self::CalendarHashChainRegistrationTime => "CalendarHashChainRegistrationTimeRule",
            Self::CalendarHashChainAlgorithmDeprecated => {
                "CalendarHashChainAlgorithmDeprecatedRule"
            }
            Self::CalendarAuthenticationRecordDoesNotExist => {
                "CalendarAuthenticationRecordDoesNotExistRule"
            }
            Self::CalendarAuthenticationRecordExistence => {
                "CalendarAuthenticationRecordExistenceRule"
            }
            Self::CalendarAuthenticationRecordPublicationTime => {
                "CalendarAuthenticationRecordPublicationTimeRule"
            }
            Self::CalendarAuthenticationRecordAggregationHash => {
                "CalendarAuthenticationRecordAggregationHashRule"
            }
            Self::CertificateExistence => "CertificateExistenceRule",
            Self::CertificateValidity => "CertificateValidityRule",
            Self::CalendarAuthenticationRecordSignature => {
                "CalendarAuthenticationRecordSignatureVerificationRule"
            }
            Self::SignaturePublicationRecordDoesNotExist => {
                "SignaturePublicationRecordDoesNotExistRule"
            }
            Self::SignaturePublicationRecordExistence => "SignaturePublicationRecordExistenceRule",
            Self::PublicationRecordPublicationTime => "PublicationRecordPublicationTimeRule",
            Self::PublicationRecordPublicationHash => "PublicationRecordPublicationHashRule",
            Self::PublicationsFileContainsSignaturePublication => {
                "PublicationsFileContainsSignaturePublicationRule"
            }
            Self::PublicationsFileHasSuitablePublication => {
                "PublicationsFileHasSuitablePublicationRule"
            }
            Self::UserProvidedPublicationExistence => "UserProvidedPublicationExistenceRule",
            Self::UserProvidedPublicationTimeMatches => {
                "UserProvidedPublicationTimeMatchesSignaturePublicationRule"
            }
            Self::UserProvidedPublicationHashMatches => {
                "UserProvidedPublicationHashMatchesSignaturePublicationRule"
            }
            Self::UserProvidedPublicationCreationTime => {
                "UserProvidedPublicationCreationTimeVerificationRule"
            }
            Self::ExtendingPermitted => "ExtendingPermittedVerificationRule",
            Self::ExtendedChainInputHash(target) => match target {
                ExtensionTarget::PublicationsFile => "PublicationsFileExtendedSignatureInputHashRule",
                ExtensionTarget::UserPublication => {
                    "UserProvidedPublicationExtendedSignatureInputHashRule"
                }
                ExtensionTarget::CalendarChain => "CalendarHashChainExtendedInputHashRule",
            },
            Self::ExtendedChainAggregationTime(target) => match target {
                ExtensionTarget::PublicationsFile => {
                    "PublicationsFileExtendedSignatureAggregationTimeRule"
                }
                ExtensionTarget::UserPublication => {
                    "UserProvidedPublicationExtendedSignatureAggregationTimeRule"
                }
                ExtensionTarget::CalendarChain => "CalendarHashChainExtendedAggregationTimeRule",
            },
            Self::ExtendedChainRootHash(target) => match target {
                ExtensionTarget::PublicationsFile => {
                    "PublicationsFilePublicationHashMatchesExtenderResponseRule"
                }
                ExtensionTarget::UserPublication => {
                    "UserProvidedPublicationHashMatchesExtendedResponseRule"
                }
                ExtensionTarget::CalendarChain => "CalendarHashChainRootHashRule",
            },
            Self::ExtendedChainRightLinksMatch(target) => match target {
                ExtensionTarget::PublicationsFile => "PublicationsFileExtendedRightLinksMatchRule",
                ExtensionTarget::UserPublication => {
                    "UserProvidedPublicationExtendedRightLinksMatchRule"
                }
                ExtensionTarget::CalendarChain => "CalendarHashChainRightLinksMatchRule",
            },
        }
    }

    /// Returns true if the rule reads the publications handler.
    #[must_use]
    pub const fn needs_publications_handler(self) -> bool {
        matches!(
            self,
            Self::CertificateExistence
                | Self::CertificateValidity
                | Self::CalendarAuthenticationRecordSignature
                | Self::PublicationsFileContainsSignaturePublication
                | Self::PublicationsFileHasSuitablePublication
                | Self::ExtendedChainInputHash(ExtensionTarget::PublicationsFile)
                | Self::ExtendedChainAggregationTime(ExtensionTarget::PublicationsFile)
                | Self::ExtendedChainRootHash(ExtensionTarget::PublicationsFile)
                | Self::ExtendedChainRightLinksMatch(ExtensionTarget::PublicationsFile)
        )
    }

    /// Returns true if the rule may call the extender.
    #[must_use]
    pub const fn needs_extender(self) -> bool {
        matches!(
            self,
            Self::ExtendedChainInputHash(_)
                | Self::ExtendedChainAggregationTime(_)
                | Self::ExtendedChainRootHash(_)
                | Self::ExtendedChainRightLinksMatch(_)
        )
    }

    /// Runs the rule body.
    fn check(self, ctx: &VerificationContext) -> RuleOutcome {
        match self {
            Self::DocumentHashDoesNotExist => document::hash_does_not_exist(ctx),
            Self::DocumentHashAlgorithm => document::hash_algorithm(ctx),
            Self::DocumentHashVerification => document::hash_verification(ctx),
            Self::DocumentHashLevel => document::hash_level(ctx),
            Self::InputHashAlgorithmDeprecated => document::input_algorithm_deprecated(ctx),
            Self::LegacyRecordDoesNotExist => legacy::does_not_exist(ctx),
            Self::LegacyRecordOutputHash => legacy::output_hash(ctx),
            Self::LegacyRecordAggregationTime => legacy::aggregation_time(ctx),
            Self::LegacyRecordChainIndex => legacy::chain_index(ctx),
            Self::LegacyRecordAlgorithmsDeprecated => legacy::algorithms_deprecated(ctx),
            Self::LegacyRecordOutputAlgorithmDeprecated => legacy::output_algorithm_deprecated(ctx),
            Self::AggregationChainConsistency => aggregation::consistency(ctx),
            Self::AggregationChainTimeConsistency => aggregation::time_consistency(ctx),
            Self::AggregationChainIndexSuccessor => aggregation::index_successor(ctx),
            Self::AggregationChainIndexConsistency => aggregation::index_consistency(ctx),
            Self::AggregationChainMetadata => aggregation::metadata(ctx),
            Self::AggregationChainAlgorithmDeprecated => aggregation::algorithm_deprecated(ctx),
            Self::CalendarHashChainDoesNotExist => calendar::does_not_exist(ctx),
            Self::CalendarHashChainExistence => calendar::existence(ctx),
            Self::CalendarHashChainInputHash => calendar::input_hash(ctx),
            Self::CalendarHashChainAggregationTime => calendar::aggregation_time(ctx),
            Self::CalendarHashChainRegistrationTime => calendar::registration_time(ctx),
            Self::CalendarHashChainAlgorithmDeprecated => calendar::algorithm_deprecated(ctx),
            Self::CalendarAuthenticationRecordDoesNotExist => auth_record::does_not_exist(ctx),
            Self::CalendarAuthenticationRecordExistence => auth_record::existence(ctx),
            Self::CalendarAuthenticationRecordPublicationTime => auth_record::publication_time(ctx),
            Self::CalendarAuthenticationRecordAggregationHash => auth_record::aggregation_hash(ctx),
            Self::CertificateExistence => auth_record::certificate_existence(ctx),
            Self::CertificateValidity => auth_record::certificate_validity(ctx),
            Self::CalendarAuthenticationRecordSignature => auth_record::signature(ctx),
            Self::SignaturePublicationRecordDoesNotExist => publication::record_does_not_exist(ctx),
            Self::SignaturePublicationRecordExistence => publication::record_existence(ctx),
            Self::PublicationRecordPublicationTime => publication::record_publication_time(ctx),
            Self::PublicationRecordPublicationHash => publication::record_publication_hash(ctx),
            Self::PublicationsFileContainsSignaturePublication => {
                publication::file_contains_signature_publication(ctx)
            }
            Self::PublicationsFileHasSuitablePublication => {
                publication::file_has_suitable_publication(ctx)
            }
            Self::UserProvidedPublicationExistence => publication::user_publication_existence(ctx),
            Self::UserProvidedPublicationTimeMatches => {
                publication::user_publication_time_matches(ctx)
            }
            Self::UserProvidedPublicationHashMatches => {
                publication::user_publication_hash_matches(ctx)
            }
            Self::UserProvidedPublicationCreationTime => {
                publication::user_publication_creation_time(ctx)
            }
            Self::ExtendingPermitted => extension::extending_permitted(ctx),
            Self::ExtendedChainInputHash(target) => extension::input_hash(ctx, target),
            Self::ExtendedChainAggregationTime(target) => extension::aggregation_time(ctx, target),
            Self::ExtendedChainRootHash(target) => extension::root_hash(ctx, target),
            Self::ExtendedChainRightLinksMatch(target) => extension::right_links_match(ctx, target),
        }
    }
}

impl fmt::Display for VerificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl LeafRule for VerificationRule {
    type Context = VerificationContext;
    type Code = VerificationErrorCode;
    type Error = VerificationError;

    fn name(&self) -> &str {
        Self::name(*self)
    }

    fn evaluate(&self, ctx: &VerificationContext) -> RuleOutcome {
        self.check(ctx)
    }
}
