//! Severity to channel routing table

use crate::models::Severity;

use super::ChannelKind;

const HIGH_CHANNELS: &[ChannelKind] = &[ChannelKind::Email, ChannelKind::Sms, ChannelKind::Push];
const MEDIUM_CHANNELS: &[ChannelKind] = &[ChannelKind::Email, ChannelKind::Push];
const LOW_CHANNELS: &[ChannelKind] = &[ChannelKind::Email];

/// Fixed fan-out policy mapping each severity tier to an ordered channel list
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingPolicy;

impl RoutingPolicy {
    const TABLE: [(Severity, &'static [ChannelKind]); 3] = [
        (Severity::High, HIGH_CHANNELS),
        (Severity::Medium, MEDIUM_CHANNELS),
        (Severity::Low, LOW_CHANNELS),
    ];

    /// Channels that must be invoked for an alert of `severity`
    pub fn channels_for(&self, severity: Severity) -> &'static [ChannelKind] {
        Self::TABLE
            .iter()
            .find(|(tier, _)| *tier == severity)
            .map(|(_, channels)| *channels)
            .unwrap_or(LOW_CHANNELS)
    }

    /// The whole table, highest severity first
    pub fn table(&self) -> &'static [(Severity, &'static [ChannelKind])] {
        &Self::TABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_per_severity() {
        let policy = RoutingPolicy;
        assert_eq!(
            policy.channels_for(Severity::High),
            &[ChannelKind::Email, ChannelKind::Sms, ChannelKind::Push]
        );
        assert_eq!(
            policy.channels_for(Severity::Medium),
            &[ChannelKind::Email, ChannelKind::Push]
        );
        assert_eq!(policy.channels_for(Severity::Low), &[ChannelKind::Email]);
    }

    #[test]
    fn test_table_covers_every_severity() {
        let policy = RoutingPolicy;
        for severity in Severity::all() {
            assert!(policy.table().iter().any(|(tier, _)| *tier == severity));
            assert!(policy.channels_for(severity).contains(&ChannelKind::Email));
        }
    }
}
