//! # Referee State Projectors
//!
//! Pure read-only transforms from the state store to narrow,
//! consumer-specific snapshots. Each view carries the current link status so
//! downstream control logic can degrade gracefully without inspecting raw
//! telemetry age itself. Safe to call from any context at any cadence.

use super::protocol::{LinkStatus, RefereeState, RFID_ENERGY, RFID_HIGH_GROUND};

/// Robot identifiers below this value are red; the blue range starts here
const BLUE_HERO_ID: u8 = 101;

/// Consumers this module can project for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerKind {
    Chassis,
    Launcher,
    Ai,
}

/// A projected snapshot for one consumer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsumerView {
    Chassis(ChassisView),
    Launcher(LauncherView),
    Ai(AiView),
}

/// Power budget snapshot for the chassis controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChassisView {
    /// Chassis power ceiling in watts
    pub power_limit_w: u16,

    /// Remaining chassis energy buffer in joules
    pub power_buffer_j: u16,

    /// Instantaneous chassis power draw in watts
    pub chassis_watt: f32,

    pub status: LinkStatus,
}

/// Heat and speed budget snapshot for the launcher controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LauncherView {
    pub heat_17_id1: u16,
    pub heat_17_id2: u16,
    pub heat_42: u16,
    pub heat_limit_17: u16,
    pub heat_limit_42: u16,
    pub cooling_17: u16,
    pub cooling_42: u16,
    pub speed_limit_17: u16,
    pub speed_limit_42: u16,

    /// Measured speed of the last launched projectile in m/s
    pub last_speed_mps: f32,

    pub status: LinkStatus,
}

/// Team classification derived from the robot identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Red,
    Blue,
}

/// Role classification derived from the robot identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Hero,
    Engineer,
    Infantry,
    Drone,
    Sentry,
    Radar,
}

/// Competition kind derived from the game status record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    Rmuc,
    Rmut,
    Rmul3v3,
    Rmul1v1,
    Unknown,
}

/// Condensed match summary for the AI bridge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiView {
    /// Projectile speed ceiling for the robot's primary barrel in m/s
    pub ball_speed_limit: u16,

    pub hp: u16,
    pub max_hp: u16,
    pub team: Team,
    pub role: Role,
    pub game_kind: GameKind,

    /// Standing in an elevated-ground RFID zone
    pub high_ground_buff: bool,

    /// Standing in an energy-mechanism RFID zone
    pub energy_buff: bool,

    pub status: LinkStatus,
}

/// Project the state store for one consumer
pub fn view_for(kind: ConsumerKind, state: &RefereeState) -> ConsumerView {
    match kind {
        ConsumerKind::Chassis => ConsumerView::Chassis(chassis_view(state)),
        ConsumerKind::Launcher => ConsumerView::Launcher(launcher_view(state)),
        ConsumerKind::Ai => ConsumerView::Ai(ai_view(state)),
    }
}

/// Project the power budget for the chassis controller
pub fn chassis_view(state: &RefereeState) -> ChassisView {
    ChassisView {
        power_limit_w: state.robot_status.chassis_power_limit,
        power_buffer_j: state.power_heat.power_buffer_j,
        chassis_watt: state.power_heat.chassis_watt,
        status: state.status,
    }
}

/// Project the heat and speed budget for the launcher controller
pub fn launcher_view(state: &RefereeState) -> LauncherView {
    LauncherView {
        heat_17_id1: state.power_heat.heat_17_id1,
        heat_17_id2: state.power_heat.heat_17_id2,
        heat_42: state.power_heat.heat_42,
        heat_limit_17: state.robot_status.heat_limit_17,
        heat_limit_42: state.robot_status.heat_limit_42,
        cooling_17: state.robot_status.cooling_17,
        cooling_42: state.robot_status.cooling_42,
        speed_limit_17: state.robot_status.speed_limit_17,
        speed_limit_42: state.robot_status.speed_limit_42,
        last_speed_mps: state.launcher_data.speed_mps,
        status: state.status,
    }
}

/// Project the match summary for the AI bridge
pub fn ai_view(state: &RefereeState) -> AiView {
    let robot_id = state.robot_status.robot_id;
    let role = classify_role(robot_id);

    let ball_speed_limit = match role {
        Role::Hero => state.robot_status.speed_limit_42,
        _ => state.robot_status.speed_limit_17,
    };

    AiView {
        ball_speed_limit,
        hp: state.robot_status.remain_hp,
        max_hp: state.robot_status.max_hp,
        team: classify_team(robot_id),
        role,
        game_kind: classify_game(state.game_status.game_type),
        high_ground_buff: state.rfid.flags & RFID_HIGH_GROUND != 0,
        energy_buff: state.rfid.flags & RFID_ENERGY != 0,
        status: state.status,
    }
}

fn classify_team(robot_id: u8) -> Team {
    if robot_id < BLUE_HERO_ID {
        Team::Red
    } else {
        Team::Blue
    }
}

fn classify_role(robot_id: u8) -> Role {
    match robot_id % 100 {
        1 => Role::Hero,
        2 => Role::Engineer,
        6 => Role::Drone,
        7 => Role::Sentry,
        9 => Role::Radar,
        _ => Role::Infantry,
    }
}

fn classify_game(game_type: u8) -> GameKind {
    match game_type {
        1 => GameKind::Rmuc,
        2 => GameKind::Rmut,
        3 => GameKind::Rmul3v3,
        4 => GameKind::Rmul1v1,
        _ => GameKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_state() -> RefereeState {
        let mut state = RefereeState::default();
        state.status = LinkStatus::Running;
        state.robot_status.robot_id = 3;
        state.robot_status.remain_hp = 350;
        state.robot_status.max_hp = 500;
        state.robot_status.chassis_power_limit = 120;
        state.robot_status.speed_limit_17 = 30;
        state.robot_status.speed_limit_42 = 16;
        state.power_heat.power_buffer_j = 60;
        state.power_heat.chassis_watt = 87.5;
        state.game_status.game_type = 1;
        state
    }

    #[test]
    fn test_chassis_view_fields() {
        let state = running_state();
        let view = chassis_view(&state);
        assert_eq!(view.power_limit_w, 120);
        assert_eq!(view.power_buffer_j, 60);
        assert!((view.chassis_watt - 87.5).abs() < f32::EPSILON);
        assert_eq!(view.status, LinkStatus::Running);
    }

    #[test]
    fn test_launcher_view_carries_status() {
        let mut state = running_state();
        state.status = LinkStatus::Offline;
        assert_eq!(launcher_view(&state).status, LinkStatus::Offline);
    }

    #[test]
    fn test_ai_view_infantry_uses_17mm_limit() {
        let state = running_state();
        let view = ai_view(&state);
        assert_eq!(view.role, Role::Infantry);
        assert_eq!(view.ball_speed_limit, 30);
        assert_eq!(view.team, Team::Red);
        assert_eq!(view.game_kind, GameKind::Rmuc);
    }

    #[test]
    fn test_ai_view_hero_uses_42mm_limit() {
        let mut state = running_state();
        state.robot_status.robot_id = 101;
        let view = ai_view(&state);
        assert_eq!(view.role, Role::Hero);
        assert_eq!(view.team, Team::Blue);
        assert_eq!(view.ball_speed_limit, 16);
    }

    #[test]
    fn test_ai_view_role_table() {
        let cases = [
            (1, Role::Hero),
            (2, Role::Engineer),
            (3, Role::Infantry),
            (5, Role::Infantry),
            (6, Role::Drone),
            (107, Role::Sentry),
            (109, Role::Radar),
        ];
        for (robot_id, expected) in cases {
            let mut state = running_state();
            state.robot_status.robot_id = robot_id;
            assert_eq!(ai_view(&state).role, expected, "robot id {}", robot_id);
        }
    }

    #[test]
    fn test_ai_view_rfid_buffs() {
        let mut state = running_state();
        state.rfid.flags = RFID_HIGH_GROUND;
        let view = ai_view(&state);
        assert!(view.high_ground_buff);
        assert!(!view.energy_buff);
    }

    #[test]
    fn test_view_for_dispatch() {
        let state = running_state();
        assert!(matches!(view_for(ConsumerKind::Chassis, &state), ConsumerView::Chassis(_)));
        assert!(matches!(view_for(ConsumerKind::Launcher, &state), ConsumerView::Launcher(_)));
        assert!(matches!(view_for(ConsumerKind::Ai, &state), ConsumerView::Ai(_)));
    }

    #[test]
    fn test_unknown_game_type() {
        let mut state = running_state();
        state.game_status.game_type = 99;
        assert_eq!(ai_view(&state).game_kind, GameKind::Unknown);
    }
}
