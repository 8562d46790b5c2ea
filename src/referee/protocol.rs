//! # Referee Protocol Constants and Types
//!
//! Core wire definitions for the referee serial protocol.
//!
//! Every inbound frame has the shape
//! `[SOF][len:2][seq][hdr_crc8][cmd_id:2][payload][crc16:2]` with all
//! multi-byte fields little-endian. The payload size is determined by the
//! command identifier through a closed lookup table ([`payload_len`]), not by
//! the length field on the wire.

/// Start-of-frame sentinel byte (always 0xA5)
pub const FRAME_SOF: u8 = 0xA5;

/// Frame header size: SOF(1) + len(2) + seq(1) + crc8(1)
pub const FRAME_HEADER_LEN: usize = 5;

/// Command identifier size
pub const CMD_ID_LEN: usize = 2;

/// Trailing CRC16 size
pub const FRAME_TAIL_LEN: usize = 2;

/// Receive buffer size for one capture cycle
pub const RX_BUFFER_LEN: usize = 255;

/// Game status command identifier
pub const CMD_GAME_STATUS: u16 = 0x0001;

/// Game result command identifier
pub const CMD_GAME_RESULT: u16 = 0x0002;

/// Robot HP table command identifier
pub const CMD_ROBOT_HP: u16 = 0x0003;

/// Field events command identifier
pub const CMD_FIELD_EVENTS: u16 = 0x0101;

/// Referee warning command identifier
pub const CMD_WARNING: u16 = 0x0104;

/// Dart countdown command identifier
pub const CMD_DART_COUNTDOWN: u16 = 0x0105;

/// Own robot status command identifier
pub const CMD_ROBOT_STATUS: u16 = 0x0201;

/// Chassis power and barrel heat command identifier
pub const CMD_POWER_HEAT: u16 = 0x0202;

/// Robot position command identifier
pub const CMD_ROBOT_POS: u16 = 0x0203;

/// Robot buff command identifier
pub const CMD_ROBOT_BUFF: u16 = 0x0204;

/// Armor damage command identifier
pub const CMD_ROBOT_DAMAGE: u16 = 0x0206;

/// Launcher data command identifier
pub const CMD_LAUNCHER_DATA: u16 = 0x0207;

/// Remaining projectiles command identifier
pub const CMD_BULLET_REMAINING: u16 = 0x0208;

/// RFID status command identifier
pub const CMD_RFID: u16 = 0x0209;

/// Inter-robot (student) command identifier, used by all outbound UI frames
pub const CMD_INTER_ROBOT: u16 = 0x0301;

/// Inter-robot sub-header size: sub_cmd(2) + sender(2) + receiver(2)
pub const INTER_ROBOT_HEADER_LEN: usize = 6;

/// UI sub-command: delete layer(s)
pub const SUB_CMD_UI_DELETE: u16 = 0x0100;

/// UI sub-command: draw one graphic
pub const SUB_CMD_UI_DRAW1: u16 = 0x0101;

/// UI sub-command: draw two graphics
pub const SUB_CMD_UI_DRAW2: u16 = 0x0102;

/// UI sub-command: draw five graphics
pub const SUB_CMD_UI_DRAW5: u16 = 0x0103;

/// UI sub-command: draw seven graphics
pub const SUB_CMD_UI_DRAW7: u16 = 0x0104;

/// UI sub-command: draw one character string
pub const SUB_CMD_UI_STRING: u16 = 0x0110;

/// Robot identifiers at or below this value belong to the red team encoding
/// range; values above it belong to the blue range
pub const BLUE_ID_BASE: u8 = 100;

/// RFID flag: base zone detected
pub const RFID_BASE: u32 = 1 << 0;

/// RFID flag: elevated ground zone detected
pub const RFID_HIGH_GROUND: u32 = 1 << 1;

/// RFID flag: energy mechanism activation zone detected
pub const RFID_ENERGY: u32 = 1 << 2;

/// Payload size in bytes for a recognized command identifier
///
/// This table is authoritative: the length field carried in the frame header
/// is never used to locate the payload boundary.
///
/// # Arguments
///
/// * `cmd_id` - Command identifier read from the frame
///
/// # Returns
///
/// * `Option<usize>` - Payload size, or `None` for an unrecognized identifier
pub fn payload_len(cmd_id: u16) -> Option<usize> {
    match cmd_id {
        CMD_GAME_STATUS => Some(GameStatus::WIRE_SIZE),
        CMD_GAME_RESULT => Some(GameResult::WIRE_SIZE),
        CMD_ROBOT_HP => Some(RobotHp::WIRE_SIZE),
        CMD_FIELD_EVENTS => Some(FieldEvents::WIRE_SIZE),
        CMD_WARNING => Some(RefereeWarning::WIRE_SIZE),
        CMD_DART_COUNTDOWN => Some(DartCountdown::WIRE_SIZE),
        CMD_ROBOT_STATUS => Some(RobotStatus::WIRE_SIZE),
        CMD_POWER_HEAT => Some(PowerHeat::WIRE_SIZE),
        CMD_ROBOT_POS => Some(RobotPos::WIRE_SIZE),
        CMD_ROBOT_BUFF => Some(RobotBuff::WIRE_SIZE),
        CMD_ROBOT_DAMAGE => Some(RobotDamage::WIRE_SIZE),
        CMD_LAUNCHER_DATA => Some(LauncherData::WIRE_SIZE),
        CMD_BULLET_REMAINING => Some(BulletRemaining::WIRE_SIZE),
        CMD_RFID => Some(Rfid::WIRE_SIZE),
        _ => None,
    }
}

/// Link status derived from telemetry arrival
///
/// `Offline` after a capture timeout; back to `Running` on the next verified
/// frame. Threaded through every projector view so consumers can degrade
/// gracefully without inspecting telemetry age themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    /// No verified telemetry within the expected window
    #[default]
    Offline,

    /// Verified telemetry is arriving
    Running,
}

/// Competition phase and clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameStatus {
    /// Competition kind (see projector::GameKind for the mapping)
    pub game_type: u8,

    /// Current phase of the match
    pub game_progress: u8,

    /// Seconds remaining in the current phase
    pub stage_remain_sec: u16,

    /// Seconds until the next dart launch window
    pub dart_remain_sec: u16,
}

impl GameStatus {
    pub const WIRE_SIZE: usize = 6;
}

/// Final match outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameResult {
    /// 0 draw, 1 red, 2 blue
    pub winner: u8,
}

impl GameResult {
    pub const WIRE_SIZE: usize = 1;
}

/// Hit points of every robot on the field
///
/// Index 0..=6 are robots 1..=7, index 7 is the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RobotHp {
    pub red: [u16; 8],
    pub blue: [u16; 8],
}

impl RobotHp {
    pub const WIRE_SIZE: usize = 32;
}

/// Field occupation/activation event bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldEvents {
    pub flags: u32,
}

impl FieldEvents {
    pub const WIRE_SIZE: usize = 4;
}

/// Penalty issued by the referee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefereeWarning {
    /// 1 yellow card, 2 red card, 3 forfeit
    pub level: u8,

    /// Identifier of the offending robot
    pub offender_id: u8,
}

impl RefereeWarning {
    pub const WIRE_SIZE: usize = 2;
}

/// Countdown to the dart launch gate closing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DartCountdown {
    pub remain_sec: u8,
}

impl DartCountdown {
    pub const WIRE_SIZE: usize = 1;
}

/// Performance envelope and vitals of the own robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RobotStatus {
    /// Own robot identifier (also selects team and role)
    pub robot_id: u8,

    /// Current upgrade level
    pub robot_level: u8,

    pub remain_hp: u16,
    pub max_hp: u16,

    /// 17 mm barrel cooling rate in heat units per second
    pub cooling_17: u16,

    /// 17 mm barrel heat ceiling
    pub heat_limit_17: u16,

    /// 17 mm projectile speed ceiling in m/s
    pub speed_limit_17: u16,

    pub cooling_42: u16,
    pub heat_limit_42: u16,
    pub speed_limit_42: u16,

    /// Chassis power ceiling in watts
    pub chassis_power_limit: u16,

    /// Power rail enable bits: gimbal(0), chassis(1), launcher(2)
    pub power_output: u8,
}

impl RobotStatus {
    pub const WIRE_SIZE: usize = 21;
}

/// Chassis power draw and barrel heat
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerHeat {
    pub chassis_volt_mv: u16,
    pub chassis_current_ma: u16,

    /// Instantaneous chassis power draw in watts
    pub chassis_watt: f32,

    /// Remaining chassis energy buffer in joules
    pub power_buffer_j: u16,

    pub heat_17_id1: u16,
    pub heat_17_id2: u16,
    pub heat_42: u16,
}

impl PowerHeat {
    pub const WIRE_SIZE: usize = 16;
}

/// Own robot pose on the field, meters and radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RobotPos {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

impl RobotPos {
    pub const WIRE_SIZE: usize = 12;
}

/// Active buff bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RobotBuff {
    pub flags: u8,
}

impl RobotBuff {
    pub const WIRE_SIZE: usize = 1;
}

/// Armor damage report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RobotDamage {
    /// Armor plate that registered the hit (low nibble on the wire)
    pub armor_id: u8,

    /// Damage cause (high nibble on the wire)
    pub kind: u8,
}

impl RobotDamage {
    pub const WIRE_SIZE: usize = 1;
}

/// Measurement of the last launched projectile
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LauncherData {
    /// 1 = 17 mm, 2 = 42 mm
    pub bullet_kind: u8,

    /// Which barrel fired
    pub launcher_id: u8,

    /// Launch rate in Hz
    pub rate_hz: u8,

    /// Measured projectile speed in m/s
    pub speed_mps: f32,
}

impl LauncherData {
    pub const WIRE_SIZE: usize = 7;
}

/// Projectile allowance remaining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulletRemaining {
    pub remain_17: u16,
    pub remain_42: u16,
    pub remain_coin: u16,
}

impl BulletRemaining {
    pub const WIRE_SIZE: usize = 6;
}

/// RFID zone detection bit set (see the `RFID_*` flag constants)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rfid {
    pub flags: u32,
}

impl Rfid {
    pub const WIRE_SIZE: usize = 4;
}

/// Last-known-good telemetry, one slot per command identifier
///
/// Owned by the link task; mutated only by the frame decoder on a verified
/// frame. No history is kept: a new verified frame overwrites the previous
/// value for its command identifier and leaves every other slot untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RefereeState {
    pub status: LinkStatus,
    pub game_status: GameStatus,
    pub game_result: GameResult,
    pub robot_hp: RobotHp,
    pub field_events: FieldEvents,
    pub warning: RefereeWarning,
    pub dart_countdown: DartCountdown,
    pub robot_status: RobotStatus,
    pub power_heat: PowerHeat,
    pub robot_pos: RobotPos,
    pub robot_buff: RobotBuff,
    pub robot_damage: RobotDamage,
    pub launcher_data: LauncherData,
    pub bullet_remaining: BulletRemaining,
    pub rfid: Rfid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constants() {
        assert_eq!(FRAME_SOF, 0xA5);
        assert_eq!(FRAME_HEADER_LEN, 5);
        assert_eq!(CMD_ID_LEN, 2);
        assert_eq!(FRAME_TAIL_LEN, 2);
    }

    #[test]
    fn test_payload_len_known_commands() {
        assert_eq!(payload_len(CMD_GAME_STATUS), Some(6));
        assert_eq!(payload_len(CMD_GAME_RESULT), Some(1));
        assert_eq!(payload_len(CMD_ROBOT_HP), Some(32));
        assert_eq!(payload_len(CMD_ROBOT_STATUS), Some(21));
        assert_eq!(payload_len(CMD_POWER_HEAT), Some(16));
        assert_eq!(payload_len(CMD_LAUNCHER_DATA), Some(7));
        assert_eq!(payload_len(CMD_RFID), Some(4));
    }

    #[test]
    fn test_payload_len_unknown_command() {
        assert_eq!(payload_len(0x0000), None);
        assert_eq!(payload_len(0x0301), None, "inter-robot frames are outbound only");
        assert_eq!(payload_len(0xFFFF), None);
    }

    #[test]
    fn test_link_status_defaults_offline() {
        assert_eq!(LinkStatus::default(), LinkStatus::Offline);
        assert_eq!(RefereeState::default().status, LinkStatus::Offline);
    }

    #[test]
    fn test_state_slots_default_to_zero() {
        let state = RefereeState::default();
        assert_eq!(state.robot_status.remain_hp, 0);
        assert_eq!(state.robot_hp.red, [0u16; 8]);
        assert_eq!(state.power_heat.chassis_watt, 0.0);
    }
}
