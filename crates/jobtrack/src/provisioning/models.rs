//! Provisioning data models.

use serde::{Deserialize, Serialize};

/// Path of the setup wizard root page.
pub const WIZARD_ROOT_PATH: &str = "/initial-setup";

/// Setup wizard stage.
///
/// Users complete these stages in declaration order:
/// 1. Backend - Connect the data backend
/// 2. AiIntegration - Configure AI API keys
/// 3. Document - Upload the default resume
/// 4. Providers - Configure at least one job provider
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Backend,
    AiIntegration,
    Document,
    Providers,
}

impl Stage {
    /// All stages in completion order.
    pub const ALL: [Stage; 4] = [
        Stage::Backend,
        Stage::AiIntegration,
        Stage::Document,
        Stage::Providers,
    ];

    /// Path segment of this stage below the wizard root.
    pub fn segment(self) -> &'static str {
        match self {
            Stage::Backend => "backend",
            Stage::AiIntegration => "ai-integration",
            Stage::Document => "document",
            Stage::Providers => "providers",
        }
    }

    /// Full wizard path for this stage.
    pub fn path(self) -> &'static str {
        match self {
            Stage::Backend => "/initial-setup/backend",
            Stage::AiIntegration => "/initial-setup/ai-integration",
            Stage::Document => "/initial-setup/document",
            Stage::Providers => "/initial-setup/providers",
        }
    }

    /// Look up a stage by its path segment.
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.segment() == segment)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.segment())
    }
}

/// A page of the setup wizard: the root (completion) page or a concrete stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Root,
    Stage(Stage),
}

impl WizardStep {
    /// Every wizard page, root first.
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Root,
        WizardStep::Stage(Stage::Backend),
        WizardStep::Stage(Stage::AiIntegration),
        WizardStep::Stage(Stage::Document),
        WizardStep::Stage(Stage::Providers),
    ];

    pub fn path(self) -> &'static str {
        match self {
            WizardStep::Root => WIZARD_ROOT_PATH,
            WizardStep::Stage(stage) => stage.path(),
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardStep::Root => f.write_str("root"),
            WizardStep::Stage(stage) => stage.fmt(f),
        }
    }
}

/// A row of the `profiles` table, as far as the gate is concerned.
///
/// The stage timestamps are owned by the wizard pages; only their presence
/// matters here, so they load as flags whatever their stored shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct ProfileRecord {
    pub setup_completed: bool,
    pub backend_stage_completed: bool,
    pub ai_stage_completed: bool,
    pub default_document_id: Option<String>,
}

/// How far a user has progressed through account provisioning.
///
/// Written by the wizard pages, read-only for the gate. The default value is
/// the state of a freshly created account with no profile row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningState {
    /// Overall flag; once set the wizard is bypassed regardless of the stage fields.
    pub setup_completed: bool,
    pub backend_stage_completed: bool,
    pub ai_stage_completed: bool,
    pub profile_document_id: Option<String>,
    /// Sourced from the provider configuration table, not the profile row.
    pub provider_config_id: Option<String>,
}

impl ProvisioningState {
    /// Combine a profile row (if any) with the provider configuration lookup.
    pub fn from_parts(profile: Option<ProfileRecord>, provider_config_id: Option<String>) -> Self {
        let profile = profile.unwrap_or_default();
        Self {
            setup_completed: profile.setup_completed,
            backend_stage_completed: profile.backend_stage_completed,
            ai_stage_completed: profile.ai_stage_completed,
            profile_document_id: profile.default_document_id,
            provider_config_id,
        }
    }

    pub fn is_stage_complete(&self, stage: Stage) -> bool {
        match stage {
            Stage::Backend => self.backend_stage_completed,
            Stage::AiIntegration => self.ai_stage_completed,
            Stage::Document => self.profile_document_id.is_some(),
            Stage::Providers => self.provider_config_id.is_some(),
        }
    }

    /// First stage in completion order that is not yet complete.
    pub fn first_incomplete_stage(&self) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .find(|stage| !self.is_stage_complete(*stage))
    }

    /// The wizard page the user has to be on next.
    ///
    /// When every stage is complete but `setup_completed` is still unset, the
    /// user finalizes setup on the wizard root.
    pub fn required_step(&self) -> WizardStep {
        self.first_incomplete_stage()
            .map_or(WizardStep::Root, WizardStep::Stage)
    }
}
