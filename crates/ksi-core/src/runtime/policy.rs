// crates/ksi-core/src/runtime/policy.rs
// ============================================================================
// Module: Verification Policies
// Description: Named rule trees, built-in policies, and collaborator binding.
// Purpose: Build the six standard policies and check that a policy can run
//          with the collaborators it is bound to.
// Dependencies: crate::{core, interfaces, runtime}, ksi-rule-logic, thiserror
// ============================================================================

//! ## Overview
//! A [`Policy`] is a named rule tree with an optional fallback policy. The
//! fallback is evaluated only when the primary tree ends in `NA`.
//!
//! Built-in trees share the `internal` policy as their first conjunct, so
//! every trust anchor check runs only over a self-consistent signature.
//!
//! [`ContextAwarePolicy`] pairs a policy with a [`PolicyContext`] and refuses
//! combinations that cannot run: a policy that reads the publications file
//! without a handler, extension without an extender, or the calendar policy
//! without permission to extend.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use ksi_rule_logic::Rule;
use ksi_rule_logic::RuleTreeError;
use ksi_rule_logic::rule;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::KsiSignature;
use crate::interfaces::Extender;
use crate::interfaces::PublicationsHandler;
use crate::runtime::context::VerificationContext;
use crate::runtime::context::VerificationInput;
use crate::runtime::rules::ExtensionTarget;
use crate::runtime::rules::VerificationRule;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default maximum rule tree depth accepted for a policy.
pub const DEFAULT_MAX_RULE_DEPTH: usize = 16;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building or binding policies.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The policy reads the publications file but no handler is bound.
    #[error("policy {0} requires a publications handler")]
    MissingPublicationsHandler(String),
    /// Extending is allowed and the policy extends, but no extender is bound.
    #[error("policy {0} requires an extender")]
    MissingExtender(String),
    /// The policy cannot pass without extending, which is not allowed.
    #[error("policy {0} requires extending to be allowed")]
    ExtendingNotAllowed(String),
    /// The rule tree is structurally invalid.
    #[error("policy {policy} has an invalid rule tree: {source}")]
    InvalidTree {
        /// Policy name.
        policy: String,
        /// Tree validation error.
        source: RuleTreeError,
    },
    /// The fallback chain already contains a policy with this name.
    #[error("policy {0} appears more than once in the fallback chain")]
    DuplicateFallback(String),
}

// ============================================================================
// SECTION: Policy Kinds
// ============================================================================

/// Built-in policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Self-consistency of the signature only.
    Internal,
    /// Internal checks plus the calendar authentication record signature.
    KeyBased,
    /// Internal checks plus a publications-file publication.
    PublicationsFile,
    /// Internal checks plus a caller-supplied publication.
    UserPublication,
    /// Internal checks plus comparison with a freshly extended calendar chain.
    Calendar,
    /// Publications-file policy falling back to the key-based policy.
    Default,
}

impl PolicyKind {
    /// Returns the configuration label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::KeyBased => "key_based",
            Self::PublicationsFile => "publications_file",
            Self::UserPublication => "user_publication",
            Self::Calendar => "calendar",
            Self::Default => "default",
        }
    }

    /// Builds the policy.
    #[must_use]
    pub fn build(self) -> Policy {
        match self {
            Self::Internal => Policy::internal(),
            Self::KeyBased => Policy::key_based(),
            Self::PublicationsFile => Policy::publications_file(),
            Self::UserPublication => Policy::user_provided_publication(),
            Self::Calendar => Policy::calendar(),
            Self::Default => Policy::default_policy(),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Named rule tree with an optional fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Reported policy name.
    name: String,
    /// Rule tree evaluated for this policy.
    rule: Rule<VerificationRule>,
    /// Policy evaluated when this one ends in `NA`.
    fallback: Option<Box<Self>>,
}

/// Collaborators and permissions a policy chain needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyRequirements {
    /// Some rule reads the publications handler.
    pub publications_handler: bool,
    /// Some rule may call the extender.
    pub extender: bool,
    /// The policy cannot pass unless extending is allowed.
    pub extending: bool,
}

impl Policy {
    /// Creates a custom policy after validating its tree.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidTree`] when the tree has an empty
    /// composite or exceeds [`DEFAULT_MAX_RULE_DEPTH`].
    pub fn new(name: impl Into<String>, rule: Rule<VerificationRule>) -> Result<Self, PolicyError> {
        let policy = Self::built_in(name, rule);
        policy.validate(DEFAULT_MAX_RULE_DEPTH)?;
        Ok(policy)
    }

    /// Wraps a built-in tree.
    fn built_in(name: impl Into<String>, rule: Rule<VerificationRule>) -> Self {
        Self {
            name: name.into(),
            rule,
            fallback: None,
        }
    }

    /// Sets the fallback policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::DuplicateFallback`] when a policy name would
    /// appear twice in the resulting chain.
    pub fn with_fallback(mut self, fallback: Self) -> Result<Self, PolicyError> {
        let existing = self.chain().map(Self::name).collect::<Vec<_>>();
        if let Some(duplicate) = fallback.chain().find(|policy| existing.contains(&policy.name())) {
            return Err(PolicyError::DuplicateFallback(duplicate.name.clone()));
        }
        self.append_fallback(fallback);
        Ok(self)
    }

    /// Attaches `fallback` at the end of the chain.
    fn append_fallback(&mut self, fallback: Self) {
        if let Some(next) = self.fallback.as_mut() {
            next.append_fallback(fallback);
        } else {
            self.fallback = Some(Box::new(fallback));
        }
    }

    /// Returns the policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the rule tree.
    #[must_use]
    pub const fn rule(&self) -> &Rule<VerificationRule> {
        &self.rule
    }

    /// Returns the fallback policy.
    #[must_use]
    pub fn fallback(&self) -> Option<&Self> {
        self.fallback.as_deref()
    }

    /// Iterates over this policy and its fallbacks in evaluation order.
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |policy| policy.fallback())
    }

    /// Validates every tree in the fallback chain.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidTree`] for the first invalid tree.
    pub fn validate(&self, max_depth: usize) -> Result<(), PolicyError> {
        self.chain().try_for_each(|policy| {
            policy.rule.validate(max_depth).map_err(|source| PolicyError::InvalidTree {
                policy: policy.name.clone(),
                source,
            })
        })
    }

    /// Returns the collaborators needed by this policy and its fallbacks.
    #[must_use]
    pub fn requirements(&self) -> PolicyRequirements {
        self.chain().fold(PolicyRequirements::default(), |acc, policy| {
            let leaves = collect_leaves(&policy.rule);
            PolicyRequirements {
                publications_handler: acc.publications_handler
                    || leaves.iter().any(|leaf| leaf.needs_publications_handler()),
                extender: acc.extender || leaves.iter().any(|leaf| leaf.needs_extender()),
                extending: acc.extending || requires_extending(&policy.rule),
            }
        })
    }

    // ------------------------------------------------------------------------
    // Built-in policies
    // ------------------------------------------------------------------------

    /// Signature self-consistency; needs no collaborators.
    #[must_use]
    pub fn internal() -> Self {
        Self::built_in("InternalVerificationPolicy", internal_rule())
    }

    /// Trust via the calendar authentication record's PKI signature.
    #[must_use]
    pub fn key_based() -> Self {
        Self::built_in("KeyBasedVerificationPolicy", key_based_rule())
    }

    /// Trust via a publication in the publications file.
    #[must_use]
    pub fn publications_file() -> Self {
        Self::built_in("PublicationsFileBasedVerificationPolicy", publications_file_rule())
    }

    /// Trust via the publication supplied with the verification input.
    #[must_use]
    pub fn user_provided_publication() -> Self {
        Self::built_in("UserProvidedPublicationBasedVerificationPolicy", user_publication_rule())
    }

    /// Trust via a calendar chain freshly fetched from the extender.
    #[must_use]
    pub fn calendar() -> Self {
        Self::built_in("CalendarBasedVerificationPolicy", calendar_rule())
    }

    /// Publications-file policy with the key-based policy as fallback.
    #[must_use]
    pub fn default_policy() -> Self {
        let mut policy = Self::built_in("DefaultVerificationPolicy", publications_file_rule());
        policy.fallback = Some(Box::new(Self::key_based()));
        policy
    }
}

/// Collects unique leaves referenced by a rule tree.
fn collect_leaves(rule: &Rule<VerificationRule>) -> Vec<VerificationRule> {
    let mut out = Vec::new();
    collect_leaves_inner(rule, &mut out);
    out
}

/// Walks a rule tree and appends leaves.
fn collect_leaves_inner(rule: &Rule<VerificationRule>, out: &mut Vec<VerificationRule>) {
    match rule {
        Rule::Leaf(leaf) => {
            if !out.contains(leaf) {
                out.push(*leaf);
            }
        }
        Rule::Not(inner) => collect_leaves_inner(inner, out),
        Rule::Composite {
            rules, ..
        } => {
            for child in rules {
                collect_leaves_inner(child, out);
            }
        }
    }
}

/// True when the root conjunction demands extending permission directly.
fn requires_extending(rule: &Rule<VerificationRule>) -> bool {
    match rule {
        Rule::Composite {
            require_all: true,
            rules,
        } => rules.iter().any(|child| **child == Rule::Leaf(VerificationRule::ExtendingPermitted)),
        Rule::Leaf(leaf) => *leaf == VerificationRule::ExtendingPermitted,
        Rule::Composite {
            require_all: false, ..
        }
        | Rule::Not(_) => false,
    }
}

// ============================================================================
// SECTION: Built-In Trees
// ============================================================================

/// Self-consistency branches for every optional signature component.
fn internal_rule() -> Rule<VerificationRule> {
    use VerificationRule as R;
    rule! {
        all [
            all [
                any [
                    leaf(R::DocumentHashDoesNotExist),
                    all [leaf(R::DocumentHashAlgorithm), leaf(R::DocumentHashVerification)]
                ],
                leaf(R::DocumentHashLevel),
                leaf(R::InputHashAlgorithmDeprecated)
            ],
            any [
                leaf(R::LegacyRecordDoesNotExist),
                all [
                    leaf(R::LegacyRecordOutputHash),
                    leaf(R::LegacyRecordAggregationTime),
                    leaf(R::LegacyRecordChainIndex),
                    leaf(R::LegacyRecordAlgorithmsDeprecated),
                    leaf(R::LegacyRecordOutputAlgorithmDeprecated)
                ]
            ],
            all [
                leaf(R::AggregationChainConsistency),
                leaf(R::AggregationChainTimeConsistency),
                leaf(R::AggregationChainIndexSuccessor),
                leaf(R::AggregationChainIndexConsistency),
                leaf(R::AggregationChainMetadata),
                leaf(R::AggregationChainAlgorithmDeprecated)
            ],
            any [
                leaf(R::CalendarHashChainDoesNotExist),
                all [
                    leaf(R::CalendarHashChainInputHash),
                    leaf(R::CalendarHashChainAggregationTime),
                    leaf(R::CalendarHashChainRegistrationTime),
                    leaf(R::CalendarHashChainAlgorithmDeprecated)
                ]
            ],
            any [
                leaf(R::CalendarAuthenticationRecordDoesNotExist),
                all [
                    leaf(R::CalendarAuthenticationRecordPublicationTime),
                    leaf(R::CalendarAuthenticationRecordAggregationHash)
                ]
            ],
            any [
                leaf(R::SignaturePublicationRecordDoesNotExist),
                all [
                    leaf(R::PublicationRecordPublicationTime),
                    leaf(R::PublicationRecordPublicationHash)
                ]
            ]
        ]
    }
}

/// Internal checks followed by the key-based chain of trust.
fn key_based_rule() -> Rule<VerificationRule> {
    use VerificationRule as R;
    Rule::all(vec![
        internal_rule(),
        Rule::leaf(R::CalendarHashChainExistence),
        Rule::leaf(R::CalendarAuthenticationRecordExistence),
        Rule::leaf(R::CertificateExistence),
        Rule::leaf(R::CertificateValidity),
        Rule::leaf(R::CalendarAuthenticationRecordSignature),
    ])
}

/// Internal checks followed by publications-file anchoring.
fn publications_file_rule() -> Rule<VerificationRule> {
    use ExtensionTarget::PublicationsFile as File;
    use VerificationRule as R;
    let anchored: Rule<VerificationRule> = rule! {
        any [
            all [
                leaf(R::SignaturePublicationRecordExistence),
                leaf(R::PublicationsFileContainsSignaturePublication)
            ],
            all [
                leaf(R::ExtendingPermitted),
                leaf(R::PublicationsFileHasSuitablePublication),
                leaf(R::ExtendedChainInputHash(File)),
                leaf(R::ExtendedChainAggregationTime(File)),
                leaf(R::ExtendedChainRootHash(File))
            ]
        ]
    };
    Rule::all(vec![internal_rule(), anchored])
}

/// Internal checks followed by user-publication anchoring.
fn user_publication_rule() -> Rule<VerificationRule> {
    use ExtensionTarget::UserPublication as User;
    use VerificationRule as R;
    let anchored: Rule<VerificationRule> = rule! {
        any [
            all [
                leaf(R::SignaturePublicationRecordExistence),
                leaf(R::UserProvidedPublicationHashMatches)
            ],
            all [
                not(leaf(R::UserProvidedPublicationTimeMatches)),
                leaf(R::UserProvidedPublicationCreationTime),
                leaf(R::ExtendingPermitted),
                leaf(R::ExtendedChainInputHash(User)),
                leaf(R::ExtendedChainAggregationTime(User)),
                leaf(R::ExtendedChainRootHash(User))
            ]
        ]
    };
    Rule::all(vec![
        internal_rule(),
        Rule::leaf(R::UserProvidedPublicationExistence),
        anchored,
    ])
}

/// Internal checks followed by comparison with an extended calendar chain.
fn calendar_rule() -> Rule<VerificationRule> {
    use ExtensionTarget::CalendarChain as Calendar;
    use VerificationRule as R;
    let calendar_match: Rule<VerificationRule> = rule! {
        any [
            leaf(R::CalendarHashChainDoesNotExist),
            all [
                leaf(R::ExtendedChainRootHash(Calendar)),
                leaf(R::ExtendedChainRightLinksMatch(Calendar))
            ]
        ]
    };
    Rule::all(vec![
        internal_rule(),
        Rule::leaf(R::ExtendingPermitted),
        Rule::leaf(R::ExtendedChainInputHash(Calendar)),
        Rule::leaf(R::ExtendedChainAggregationTime(Calendar)),
        calendar_match,
    ])
}

// ============================================================================
// SECTION: Collaborators
// ============================================================================

/// Collaborators and permissions bound to a policy.
#[derive(Clone, Default)]
pub struct PolicyContext {
    /// Calendar extender.
    pub extender: Option<Arc<dyn Extender>>,
    /// Publications file and certificate source.
    pub publications: Option<Arc<dyn PublicationsHandler>>,
    /// Whether rules may request extended calendar chains.
    pub extending_allowed: bool,
}

impl PolicyContext {
    /// Binds an extender.
    #[must_use]
    pub fn with_extender(mut self, extender: Arc<dyn Extender>) -> Self {
        self.extender = Some(extender);
        self
    }

    /// Binds a publications handler.
    #[must_use]
    pub fn with_publications(mut self, publications: Arc<dyn PublicationsHandler>) -> Self {
        self.publications = Some(publications);
        self
    }

    /// Sets the extending permission.
    #[must_use]
    pub const fn allow_extending(mut self, allowed: bool) -> Self {
        self.extending_allowed = allowed;
        self
    }
}

impl fmt::Debug for PolicyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyContext")
            .field("extender", &self.extender.is_some())
            .field("publications", &self.publications.is_some())
            .field("extending_allowed", &self.extending_allowed)
            .finish()
    }
}

/// Policy bound to collaborators it has been checked against.
#[derive(Debug, Clone)]
pub struct ContextAwarePolicy {
    /// Policy to evaluate.
    policy: Policy,
    /// Bound collaborators.
    context: PolicyContext,
}

impl ContextAwarePolicy {
    /// Binds `policy` to `context`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the policy needs a collaborator or
    /// permission the context does not provide.
    pub fn new(policy: Policy, context: PolicyContext) -> Result<Self, PolicyError> {
        let needs = policy.requirements();
        let name = policy.name().to_string();
        if needs.extending && !context.extending_allowed {
            return Err(PolicyError::ExtendingNotAllowed(name));
        }
        if needs.extender && context.extending_allowed && context.extender.is_none() {
            return Err(PolicyError::MissingExtender(name));
        }
        if needs.publications_handler && context.publications.is_none() {
            return Err(PolicyError::MissingPublicationsHandler(name));
        }
        Ok(Self {
            policy,
            context,
        })
    }

    /// Returns the policy.
    #[must_use]
    pub const fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Returns the bound collaborators.
    #[must_use]
    pub const fn context(&self) -> &PolicyContext {
        &self.context
    }

    /// Builds a verification context for one run.
    #[must_use]
    pub fn context_for(&self, signature: KsiSignature, input: VerificationInput) -> VerificationContext {
        VerificationContext::new(signature, input, self.context.clone())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
