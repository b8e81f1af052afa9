//! Boot-time discovery of the record and playback endpoints

use super::device::{AudioBackend, Endpoint};
use crate::error::AudioError;

/// The pair of endpoints every later command works against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSet {
    /// Endpoint every `record` captures from
    pub record: Endpoint,
    /// Endpoint reserved for `play`
    pub playback: Endpoint,
}

/// Scan every card and pick the endpoints of the one named `card_name`.
///
/// Every card's devices are enumerated even when the name doesn't match, so a
/// broken card still surfaces as an enumeration failure. The first
/// record-capable endpoint wins the record role; the first play-only endpoint
/// wins playback.
pub fn find_devices(backend: &dyn AudioBackend, card_name: &str) -> Result<DeviceSet, AudioError> {
    let cards = backend.cards()?;

    let mut record: Option<Endpoint> = None;
    let mut playback: Option<Endpoint> = None;

    for card in &cards {
        let devices = backend.devices(card)?;
        tracing::debug!("Card {} {:?}: {} devices", card.index, card.name, devices.len());

        if card.name != card_name {
            continue;
        }

        for device in devices {
            if device.supports_record {
                if record.is_none() {
                    record = Some(device);
                }
            } else if device.supports_play && playback.is_none() {
                playback = Some(device);
            }
        }
    }

    match (record, playback) {
        (Some(record), Some(playback)) => {
            tracing::info!("Record device: {}", record);
            tracing::info!("Playback device: {}", playback);
            Ok(DeviceSet { record, playback })
        }
        _ => Err(AudioError::DevicesNotFound(card_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::{endpoint, MockBackend};
    use crate::constants::TARGET_CARD_NAME;

    fn appliance_backend() -> MockBackend {
        MockBackend::new()
            .with_card(0, "HDA Intel PCH", vec![
                endpoint(0, "HDA Intel PCH", 0, "ALC892 Analog", true, false),
                endpoint(0, "HDA Intel PCH", 1, "ALC892 Digital", false, true),
            ])
            .with_card(1, TARGET_CARD_NAME, vec![
                endpoint(1, TARGET_CARD_NAME, 0, "USB Audio In", true, false),
                endpoint(1, TARGET_CARD_NAME, 1, "USB Audio Out", false, true),
            ])
    }

    #[test]
    fn test_selects_both_roles_on_target_card() {
        let devices = find_devices(&appliance_backend(), TARGET_CARD_NAME).unwrap();
        assert_eq!(devices.record.card_name, TARGET_CARD_NAME);
        assert_eq!(devices.record.name, "USB Audio In");
        assert_eq!(devices.playback.card_name, TARGET_CARD_NAME);
        assert_eq!(devices.playback.name, "USB Audio Out");
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let backend = appliance_backend();
        let first = find_devices(&backend, TARGET_CARD_NAME).unwrap();
        for _ in 0..5 {
            assert_eq!(find_devices(&backend, TARGET_CARD_NAME).unwrap(), first);
        }
    }

    #[test]
    fn test_other_cards_are_never_selected() {
        let backend = MockBackend::new()
            .with_card(0, "USB Audio Device 2", vec![
                endpoint(0, "USB Audio Device 2", 0, "In", true, false),
                endpoint(0, "USB Audio Device 2", 1, "Out", false, true),
            ])
            .with_card(1, TARGET_CARD_NAME, vec![endpoint(1, TARGET_CARD_NAME, 0, "In", true, false)]);

        let err = find_devices(&backend, TARGET_CARD_NAME).unwrap_err();
        assert!(matches!(err, AudioError::DevicesNotFound(_)));
    }

    #[test]
    fn test_duplex_device_is_claimed_for_recording() {
        let backend = MockBackend::new().with_card(2, TARGET_CARD_NAME, vec![
            endpoint(2, TARGET_CARD_NAME, 0, "Duplex", true, true),
            endpoint(2, TARGET_CARD_NAME, 1, "Out", false, true),
        ]);

        let devices = find_devices(&backend, TARGET_CARD_NAME).unwrap();
        assert_eq!(devices.record.device_index, 0);
        assert_eq!(devices.playback.device_index, 1);
    }

    #[test]
    fn test_missing_role_is_an_error() {
        let backend = MockBackend::new().with_card(1, TARGET_CARD_NAME, vec![
            endpoint(1, TARGET_CARD_NAME, 1, "Out", false, true),
        ]);
        assert!(find_devices(&backend, TARGET_CARD_NAME).is_err());
        assert!(find_devices(&MockBackend::new(), TARGET_CARD_NAME).is_err());
    }

    #[test]
    fn test_enumeration_failures_propagate() {
        let backend = appliance_backend().failing_cards("no sound cards");
        assert!(matches!(
            find_devices(&backend, TARGET_CARD_NAME),
            Err(AudioError::Enumeration(_))
        ));

        let backend = appliance_backend().failing_devices(0, "ctl open failed");
        assert!(matches!(
            find_devices(&backend, TARGET_CARD_NAME),
            Err(AudioError::Enumeration(_))
        ));
    }
}
