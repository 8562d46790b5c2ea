//! # Referee Frame Decoder
//!
//! Recovers validated frames from one captured receive buffer and applies
//! them to the state store.
//!
//! This module handles:
//! - Resynchronizing scan for the start-of-frame marker
//! - Header CRC8 and full-frame CRC16 verification
//! - Command dispatch through the closed payload-length table
//! - Field-by-field record decoding (never via struct layout)

use super::crc::{verify_crc16, verify_crc8};
use super::protocol::*;

/// Outcome of parsing one capture cycle
///
/// None of these conditions is an error: noise, corrupt candidates and
/// truncated tails are normal occurrences on a shared line. An unrecognized
/// command identifier is the only debug-observable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseReport {
    /// Verified frames applied to the state store
    pub frames_applied: usize,

    /// Noise bytes dropped while hunting for a frame
    pub bytes_skipped: usize,

    /// First unrecognized command identifier, if one ended the scan early
    pub unknown_command: Option<u16>,
}

/// Parse one captured buffer and apply every verified frame to `state`
///
/// Scans forward for the start-of-frame marker, dropping noise bytes. A
/// candidate whose header checksum fails costs exactly one byte of progress,
/// so a false-positive marker never swallows a following real frame. The
/// payload boundary comes from the command table ([`payload_len`]); an
/// unrecognized identifier abandons the remainder of the capture because its
/// true payload size is unknowable and there is no safe resync point. A
/// frame whose trailing checksum fails is discarded without touching the
/// state store, and scanning resumes after it.
///
/// The buffer may end mid-frame (idle-line terminated capture): a truncated
/// header or payload is treated as "no further frames this cycle".
///
/// # Arguments
///
/// * `capture` - Bytes captured during one receive cycle
/// * `state` - State store receiving verified records
///
/// # Returns
///
/// * `ParseReport` - Counts of applied frames and dropped bytes
pub fn parse_capture(capture: &[u8], state: &mut RefereeState) -> ParseReport {
    let mut report = ParseReport::default();
    let mut cursor = 0usize;

    while cursor < capture.len() {
        if capture[cursor] != FRAME_SOF {
            cursor += 1;
            report.bytes_skipped += 1;
            continue;
        }

        let Some(header) = capture.get(cursor..cursor + FRAME_HEADER_LEN) else {
            break;
        };
        if !verify_crc8(header) {
            cursor += 1;
            report.bytes_skipped += 1;
            continue;
        }

        let cmd_at = cursor + FRAME_HEADER_LEN;
        let Some(cmd_bytes) = capture.get(cmd_at..cmd_at + CMD_ID_LEN) else {
            break;
        };
        let cmd_id = u16::from_le_bytes([cmd_bytes[0], cmd_bytes[1]]);

        let Some(payload_size) = payload_len(cmd_id) else {
            report.unknown_command = Some(cmd_id);
            break;
        };

        let payload_at = cmd_at + CMD_ID_LEN;
        let frame_end = payload_at + payload_size + FRAME_TAIL_LEN;
        if frame_end > capture.len() {
            break;
        }

        if verify_crc16(&capture[cursor..frame_end]) {
            apply_record(state, cmd_id, &capture[payload_at..payload_at + payload_size]);
            state.status = LinkStatus::Running;
            report.frames_applied += 1;
        }
        cursor = frame_end;
    }

    report
}

/// Decode a verified payload into its state slot, overwriting the prior value
///
/// The caller guarantees `payload.len()` matches the table entry for
/// `cmd_id`; identifiers outside the table never reach this point.
pub fn apply_record(state: &mut RefereeState, cmd_id: u16, payload: &[u8]) {
    match cmd_id {
        CMD_GAME_STATUS => state.game_status = decode_game_status(payload),
        CMD_GAME_RESULT => state.game_result = decode_game_result(payload),
        CMD_ROBOT_HP => state.robot_hp = decode_robot_hp(payload),
        CMD_FIELD_EVENTS => state.field_events = decode_field_events(payload),
        CMD_WARNING => state.warning = decode_warning(payload),
        CMD_DART_COUNTDOWN => state.dart_countdown = decode_dart_countdown(payload),
        CMD_ROBOT_STATUS => state.robot_status = decode_robot_status(payload),
        CMD_POWER_HEAT => state.power_heat = decode_power_heat(payload),
        CMD_ROBOT_POS => state.robot_pos = decode_robot_pos(payload),
        CMD_ROBOT_BUFF => state.robot_buff = decode_robot_buff(payload),
        CMD_ROBOT_DAMAGE => state.robot_damage = decode_robot_damage(payload),
        CMD_LAUNCHER_DATA => state.launcher_data = decode_launcher_data(payload),
        CMD_BULLET_REMAINING => state.bullet_remaining = decode_bullet_remaining(payload),
        CMD_RFID => state.rfid = decode_rfid(payload),
        _ => {}
    }
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn le_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Decode a game status payload (6 bytes)
pub fn decode_game_status(payload: &[u8]) -> GameStatus {
    debug_assert_eq!(payload.len(), GameStatus::WIRE_SIZE);
    GameStatus {
        game_type: payload[0],
        game_progress: payload[1],
        stage_remain_sec: le_u16(payload, 2),
        dart_remain_sec: le_u16(payload, 4),
    }
}

/// Decode a game result payload (1 byte)
pub fn decode_game_result(payload: &[u8]) -> GameResult {
    debug_assert_eq!(payload.len(), GameResult::WIRE_SIZE);
    GameResult { winner: payload[0] }
}

/// Decode a robot HP table payload (32 bytes, red robots first)
pub fn decode_robot_hp(payload: &[u8]) -> RobotHp {
    debug_assert_eq!(payload.len(), RobotHp::WIRE_SIZE);
    let mut hp = RobotHp::default();
    for slot in 0..8 {
        hp.red[slot] = le_u16(payload, slot * 2);
        hp.blue[slot] = le_u16(payload, 16 + slot * 2);
    }
    hp
}

/// Decode a field events payload (4 bytes)
pub fn decode_field_events(payload: &[u8]) -> FieldEvents {
    debug_assert_eq!(payload.len(), FieldEvents::WIRE_SIZE);
    FieldEvents {
        flags: le_u32(payload, 0),
    }
}

/// Decode a referee warning payload (2 bytes)
pub fn decode_warning(payload: &[u8]) -> RefereeWarning {
    debug_assert_eq!(payload.len(), RefereeWarning::WIRE_SIZE);
    RefereeWarning {
        level: payload[0],
        offender_id: payload[1],
    }
}

/// Decode a dart countdown payload (1 byte)
pub fn decode_dart_countdown(payload: &[u8]) -> DartCountdown {
    debug_assert_eq!(payload.len(), DartCountdown::WIRE_SIZE);
    DartCountdown {
        remain_sec: payload[0],
    }
}

/// Decode a robot status payload (21 bytes)
pub fn decode_robot_status(payload: &[u8]) -> RobotStatus {
    debug_assert_eq!(payload.len(), RobotStatus::WIRE_SIZE);
    RobotStatus {
        robot_id: payload[0],
        robot_level: payload[1],
        remain_hp: le_u16(payload, 2),
        max_hp: le_u16(payload, 4),
        cooling_17: le_u16(payload, 6),
        heat_limit_17: le_u16(payload, 8),
        speed_limit_17: le_u16(payload, 10),
        cooling_42: le_u16(payload, 12),
        heat_limit_42: le_u16(payload, 14),
        speed_limit_42: le_u16(payload, 16),
        chassis_power_limit: le_u16(payload, 18),
        power_output: payload[20],
    }
}

/// Decode a power/heat payload (16 bytes)
pub fn decode_power_heat(payload: &[u8]) -> PowerHeat {
    debug_assert_eq!(payload.len(), PowerHeat::WIRE_SIZE);
    PowerHeat {
        chassis_volt_mv: le_u16(payload, 0),
        chassis_current_ma: le_u16(payload, 2),
        chassis_watt: le_f32(payload, 4),
        power_buffer_j: le_u16(payload, 8),
        heat_17_id1: le_u16(payload, 10),
        heat_17_id2: le_u16(payload, 12),
        heat_42: le_u16(payload, 14),
    }
}

/// Decode a robot position payload (12 bytes)
pub fn decode_robot_pos(payload: &[u8]) -> RobotPos {
    debug_assert_eq!(payload.len(), RobotPos::WIRE_SIZE);
    RobotPos {
        x: le_f32(payload, 0),
        y: le_f32(payload, 4),
        angle: le_f32(payload, 8),
    }
}

/// Decode a robot buff payload (1 byte)
pub fn decode_robot_buff(payload: &[u8]) -> RobotBuff {
    debug_assert_eq!(payload.len(), RobotBuff::WIRE_SIZE);
    RobotBuff { flags: payload[0] }
}

/// Decode an armor damage payload (1 byte: armor id in the low nibble,
/// damage kind in the high nibble)
pub fn decode_robot_damage(payload: &[u8]) -> RobotDamage {
    debug_assert_eq!(payload.len(), RobotDamage::WIRE_SIZE);
    RobotDamage {
        armor_id: payload[0] & 0x0F,
        kind: (payload[0] >> 4) & 0x0F,
    }
}

/// Decode a launcher data payload (7 bytes)
pub fn decode_launcher_data(payload: &[u8]) -> LauncherData {
    debug_assert_eq!(payload.len(), LauncherData::WIRE_SIZE);
    LauncherData {
        bullet_kind: payload[0],
        launcher_id: payload[1],
        rate_hz: payload[2],
        speed_mps: le_f32(payload, 3),
    }
}

/// Decode a remaining projectiles payload (6 bytes)
pub fn decode_bullet_remaining(payload: &[u8]) -> BulletRemaining {
    debug_assert_eq!(payload.len(), BulletRemaining::WIRE_SIZE);
    BulletRemaining {
        remain_17: le_u16(payload, 0),
        remain_42: le_u16(payload, 2),
        remain_coin: le_u16(payload, 4),
    }
}

/// Decode an RFID payload (4 bytes)
pub fn decode_rfid(payload: &[u8]) -> Rfid {
    debug_assert_eq!(payload.len(), Rfid::WIRE_SIZE);
    Rfid {
        flags: le_u32(payload, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referee::crc::{crc16, crc8};

    /// Build a well-formed frame around `payload` for `cmd_id`
    fn make_frame(cmd_id: u16, payload: &[u8], seq: u8) -> Vec<u8> {
        let mut frame = vec![FRAME_SOF];
        frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        frame.push(seq);
        frame.push(crc8(&frame));
        frame.extend_from_slice(&cmd_id.to_le_bytes());
        frame.extend_from_slice(payload);
        let tail = crc16(&frame);
        frame.extend_from_slice(&tail.to_le_bytes());
        frame
    }

    fn power_heat_payload() -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&24000u16.to_le_bytes());
        payload.extend_from_slice(&1500u16.to_le_bytes());
        payload.extend_from_slice(&55.5f32.to_le_bytes());
        payload.extend_from_slice(&60u16.to_le_bytes());
        payload.extend_from_slice(&120u16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&30u16.to_le_bytes());
        payload
    }

    #[test]
    fn test_example_game_status_frame_bytes() {
        // Known-answer check for the whole frame layout: 6-byte all-zero game
        // status payload, sequence number 0.
        let frame = make_frame(CMD_GAME_STATUS, &[0u8; 6], 0);
        assert_eq!(
            frame,
            vec![
                0xA5, 0x06, 0x00, 0x00, 0x12, // header, crc8 = 0x12
                0x01, 0x00, // cmd id
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // payload
                0x13, 0xB2, // crc16 = 0xB213
            ]
        );
    }

    #[test]
    fn test_example_frame_updates_only_game_status() {
        let mut state = RefereeState::default();
        state.robot_status.remain_hp = 321;
        state.power_heat.heat_42 = 7;
        let before = state;

        let frame = make_frame(CMD_GAME_STATUS, &[0u8; 6], 0);
        let report = parse_capture(&frame, &mut state);

        assert_eq!(report.frames_applied, 1);
        assert_eq!(report.bytes_skipped, 0);
        assert_eq!(report.unknown_command, None);
        assert_eq!(state.game_status, GameStatus::default());

        // Every other slot is byte-for-byte untouched.
        let mut expected = before;
        expected.game_status = GameStatus::default();
        expected.status = LinkStatus::Running;
        assert_eq!(state, expected);
    }

    #[test]
    fn test_exact_field_update() {
        let mut state = RefereeState::default();
        let frame = make_frame(CMD_POWER_HEAT, &power_heat_payload(), 1);
        let report = parse_capture(&frame, &mut state);

        assert_eq!(report.frames_applied, 1);
        assert_eq!(state.power_heat.chassis_volt_mv, 24000);
        assert_eq!(state.power_heat.chassis_current_ma, 1500);
        assert!((state.power_heat.chassis_watt - 55.5).abs() < f32::EPSILON);
        assert_eq!(state.power_heat.power_buffer_j, 60);
        assert_eq!(state.power_heat.heat_17_id1, 120);
        assert_eq!(state.power_heat.heat_42, 30);

        let mut expected = RefereeState::default();
        expected.power_heat = state.power_heat;
        expected.status = LinkStatus::Running;
        assert_eq!(state, expected);
    }

    #[test]
    fn test_resync_over_noise() {
        let noise = [0x11u8, 0x22, 0x33, 0x44, 0x55];
        let mut capture = noise.to_vec();
        capture.extend(make_frame(CMD_GAME_RESULT, &[2], 3));

        let mut state = RefereeState::default();
        let report = parse_capture(&capture, &mut state);

        assert_eq!(report.frames_applied, 1);
        assert_eq!(report.bytes_skipped, noise.len());
        assert_eq!(state.game_result.winner, 2);
        assert_eq!(state.status, LinkStatus::Running);
    }

    #[test]
    fn test_false_sof_costs_one_byte() {
        // A stray marker byte followed by junk: header verification fails and
        // the scan advances one byte at a time until the real frame.
        let prefix = [FRAME_SOF, 0x11, 0x22, 0x33];
        let mut capture = prefix.to_vec();
        capture.extend(make_frame(CMD_GAME_RESULT, &[1], 0));

        let mut state = RefereeState::default();
        let report = parse_capture(&capture, &mut state);

        assert_eq!(report.frames_applied, 1);
        assert_eq!(report.bytes_skipped, prefix.len());
        assert_eq!(state.game_result.winner, 1);
    }

    #[test]
    fn test_corrupt_payload_checksum_discards_frame() {
        let mut frame = make_frame(CMD_GAME_RESULT, &[1], 0);
        let tail = frame.len() - 1;
        frame[tail] ^= 0xFF;

        let mut state = RefereeState::default();
        let report = parse_capture(&frame, &mut state);

        assert_eq!(report.frames_applied, 0);
        assert_eq!(state, RefereeState::default());
    }

    #[test]
    fn test_corrupt_frame_does_not_block_following_frame() {
        // Discarding a frame with a bad trailing checksum resumes scanning
        // after it, so a good frame packed into the same capture still lands.
        let mut first = make_frame(CMD_GAME_RESULT, &[1], 0);
        let tail = first.len() - 1;
        first[tail] ^= 0xFF;
        let mut capture = first;
        capture.extend(make_frame(CMD_GAME_STATUS, &[0u8; 6], 1));

        let mut state = RefereeState::default();
        let report = parse_capture(&capture, &mut state);

        assert_eq!(report.frames_applied, 1);
        assert_eq!(state.game_result, GameResult::default());
        assert_eq!(state.status, LinkStatus::Running);
    }

    #[test]
    fn test_single_bit_corruption_never_applies() {
        // Flip every bit in the checksum-covered region of a valid frame; no
        // corrupted variant may mutate the state store.
        let payload = [0xAAu8, 0x01, 0x02, 0x03, 0x04, 0x55];
        let frame = make_frame(CMD_GAME_STATUS, &payload, 7);
        let covered_bits = (frame.len() - FRAME_TAIL_LEN) * 8;

        for bit in 0..covered_bits {
            let mut corrupt = frame.clone();
            corrupt[bit / 8] ^= 1 << (bit % 8);

            let mut state = RefereeState::default();
            parse_capture(&corrupt, &mut state);
            assert_eq!(
                state.game_status,
                GameStatus::default(),
                "bit flip at {} reached the state store",
                bit
            );
        }
    }

    #[test]
    fn test_truncated_tail_is_silent() {
        let frame = make_frame(CMD_ROBOT_HP, &[0u8; 32], 0);

        for cut in 1..frame.len() {
            let mut state = RefereeState::default();
            let report = parse_capture(&frame[..cut], &mut state);
            assert_eq!(report.frames_applied, 0, "truncation at {} applied a frame", cut);
            assert_eq!(report.unknown_command, None);
        }
    }

    #[test]
    fn test_unknown_command_abandons_rest_of_capture() {
        // A frame with an unrecognized command id followed by a valid frame:
        // the remainder of the capture is abandoned, so the second frame is
        // lost for this cycle.
        let mut capture = make_frame(0x0A0A, &[0u8; 4], 0);
        capture.extend(make_frame(CMD_GAME_RESULT, &[2], 1));

        let mut state = RefereeState::default();
        let report = parse_capture(&capture, &mut state);

        assert_eq!(report.frames_applied, 0);
        assert_eq!(report.unknown_command, Some(0x0A0A));
        assert_eq!(state.game_result.winner, 0);
    }

    #[test]
    fn test_multiple_frames_in_one_capture() {
        let mut capture = make_frame(CMD_GAME_RESULT, &[1], 0);
        capture.extend(make_frame(CMD_DART_COUNTDOWN, &[9], 1));
        capture.extend(make_frame(CMD_ROBOT_BUFF, &[0x05], 2));

        let mut state = RefereeState::default();
        let report = parse_capture(&capture, &mut state);

        assert_eq!(report.frames_applied, 3);
        assert_eq!(state.game_result.winner, 1);
        assert_eq!(state.dart_countdown.remain_sec, 9);
        assert_eq!(state.robot_buff.flags, 0x05);
    }

    #[test]
    fn test_empty_capture() {
        let mut state = RefereeState::default();
        let report = parse_capture(&[], &mut state);
        assert_eq!(report, ParseReport::default());
        assert_eq!(state.status, LinkStatus::Offline);
    }

    #[test]
    fn test_decode_robot_status() {
        let mut payload = vec![3u8, 2];
        for value in [400u16, 500, 40, 240, 30, 0, 0, 0, 120] {
            payload.extend_from_slice(&value.to_le_bytes());
        }
        payload.push(0b0000_0111);

        let status = decode_robot_status(&payload);
        assert_eq!(status.robot_id, 3);
        assert_eq!(status.robot_level, 2);
        assert_eq!(status.remain_hp, 400);
        assert_eq!(status.max_hp, 500);
        assert_eq!(status.cooling_17, 40);
        assert_eq!(status.heat_limit_17, 240);
        assert_eq!(status.speed_limit_17, 30);
        assert_eq!(status.chassis_power_limit, 120);
        assert_eq!(status.power_output, 0b0000_0111);
    }

    #[test]
    fn test_decode_robot_damage_nibbles() {
        let damage = decode_robot_damage(&[0x23]);
        assert_eq!(damage.armor_id, 3);
        assert_eq!(damage.kind, 2);
    }

    #[test]
    fn test_decode_robot_hp_layout() {
        let mut payload = Vec::new();
        for value in 1u16..=16 {
            payload.extend_from_slice(&(value * 100).to_le_bytes());
        }

        let hp = decode_robot_hp(&payload);
        assert_eq!(hp.red[0], 100);
        assert_eq!(hp.red[7], 800);
        assert_eq!(hp.blue[0], 900);
        assert_eq!(hp.blue[7], 1600);
    }
}
