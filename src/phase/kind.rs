//! Phase tags.

use serde::{Deserialize, Serialize};

/// Discriminant of a phase.
///
/// Used for dispatch to a handler and for lookup/removal by kind.
/// `Custom` leaves room for game-specific steps the scheduler does not
/// need to know about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    // Session flow
    Login,
    Title,

    // Turn skeleton
    TurnInit,
    Command,
    EnemyCommand,
    TurnStart,
    TurnEnd,

    // Move resolution
    Move,
    MoveHeader,
    MoveEffect,
    MoveEnd,

    // Field changes
    Faint,
    Recall,
    Switch,
    Summon,
    SwitchSummon,
    PostSummon,
    CheckSwitch,

    // End of turn effects
    WeatherEffect,
    PositionalTag,
    Berry,
    CheckStatusEffect,
    PostTurnStatusEffect,

    // Presentation
    Message,
    ShowAbility,
    HideAbility,

    // Non-move commands
    AttemptRun,
    AttemptCapture,

    // Battle outcome
    Victory,
    BattleEnd,

    /// Placeholder deferring to a speed-ordered queue.
    DynamicMarker,

    Custom(u16),
}

impl PhaseKind {
    /// Every kind with built-in meaning, excluding markers and custom kinds.
    pub const BUILT_IN: &'static [PhaseKind] = &[
        PhaseKind::Login,
        PhaseKind::Title,
        PhaseKind::TurnInit,
        PhaseKind::Command,
        PhaseKind::EnemyCommand,
        PhaseKind::TurnStart,
        PhaseKind::TurnEnd,
        PhaseKind::Move,
        PhaseKind::MoveHeader,
        PhaseKind::MoveEffect,
        PhaseKind::MoveEnd,
        PhaseKind::Faint,
        PhaseKind::Recall,
        PhaseKind::Switch,
        PhaseKind::Summon,
        PhaseKind::SwitchSummon,
        PhaseKind::PostSummon,
        PhaseKind::CheckSwitch,
        PhaseKind::WeatherEffect,
        PhaseKind::PositionalTag,
        PhaseKind::Berry,
        PhaseKind::CheckStatusEffect,
        PhaseKind::PostTurnStatusEffect,
        PhaseKind::Message,
        PhaseKind::ShowAbility,
        PhaseKind::HideAbility,
        PhaseKind::AttemptRun,
        PhaseKind::AttemptCapture,
        PhaseKind::Victory,
        PhaseKind::BattleEnd,
    ];

    /// Canonical phase name, as it appears in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PhaseKind::Login => "LoginPhase",
            PhaseKind::Title => "TitlePhase",
            PhaseKind::TurnInit => "TurnInitPhase",
            PhaseKind::Command => "CommandPhase",
            PhaseKind::EnemyCommand => "EnemyCommandPhase",
            PhaseKind::TurnStart => "TurnStartPhase",
            PhaseKind::TurnEnd => "TurnEndPhase",
            PhaseKind::Move => "MovePhase",
            PhaseKind::MoveHeader => "MoveHeaderPhase",
            PhaseKind::MoveEffect => "MoveEffectPhase",
            PhaseKind::MoveEnd => "MoveEndPhase",
            PhaseKind::Faint => "FaintPhase",
            PhaseKind::Recall => "RecallPhase",
            PhaseKind::Switch => "SwitchPhase",
            PhaseKind::Summon => "SummonPhase",
            PhaseKind::SwitchSummon => "SwitchSummonPhase",
            PhaseKind::PostSummon => "PostSummonPhase",
            PhaseKind::CheckSwitch => "CheckSwitchPhase",
            PhaseKind::WeatherEffect => "WeatherEffectPhase",
            PhaseKind::PositionalTag => "PositionalTagPhase",
            PhaseKind::Berry => "BerryPhase",
            PhaseKind::CheckStatusEffect => "CheckStatusEffectPhase",
            PhaseKind::PostTurnStatusEffect => "PostTurnStatusEffectPhase",
            PhaseKind::Message => "MessagePhase",
            PhaseKind::ShowAbility => "ShowAbilityPhase",
            PhaseKind::HideAbility => "HideAbilityPhase",
            PhaseKind::AttemptRun => "AttemptRunPhase",
            PhaseKind::AttemptCapture => "AttemptCapturePhase",
            PhaseKind::Victory => "VictoryPhase",
            PhaseKind::BattleEnd => "BattleEndPhase",
            PhaseKind::DynamicMarker => "DynamicPhaseMarker",
            PhaseKind::Custom(_) => "CustomPhase",
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseKind::Custom(id) => write!(f, "CustomPhase({id})"),
            other => f.write_str(other.name()),
        }
    }
}
