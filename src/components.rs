use bevy::prelude::*;

/// Marks the player entity
#[derive(Component)]
pub struct Player;

/// Classification of a tile as seen by the engine
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum TileKind {
    Empty = 0,
    Solid = 1,
    Hazard = 2,
}

impl TileKind {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => TileKind::Solid,
            2 => TileKind::Hazard,
            _ => TileKind::Empty,
        }
    }
}

/// Integer tile coordinates. Row 0 is the top row of the map.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TileCoord {
    pub col: i32,
    pub row: i32,
}

impl TileCoord {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn offset(self, dcol: i32, drow: i32) -> Self {
        Self {
            col: self.col + dcol,
            row: self.row + drow,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Facing {
    #[default]
    Idle,
    Left,
    Right,
}

/// Why a run ended.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum TerminalReason {
    Fell,
    Hazard,
    Goal,
}

impl TerminalReason {
    pub fn label(self) -> &'static str {
        match self {
            TerminalReason::Fell => "fell",
            TerminalReason::Hazard => "hazard",
            TerminalReason::Goal => "goal",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ActorState {
    #[default]
    Alive,
    Terminal(TerminalReason),
}

/// Simulation state of a player-controlled body.
///
/// `desired_position` is scratch space for the step in progress; `position` is only
/// written from a fully resolved `desired_position` when the step commits.
#[derive(Component, Clone, Copy, Debug)]
pub struct Actor {
    pub position: Vec2,
    pub desired_position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
    pub on_ground: bool,
    pub facing: Facing,
    pub state: ActorState,
}

impl Actor {
    pub fn spawn(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            desired_position: position,
            velocity: Vec2::ZERO,
            size,
            on_ground: false,
            facing: Facing::Idle,
            state: ActorState::Alive,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == ActorState::Alive
    }

    pub fn terminal(&self) -> Option<TerminalReason> {
        match self.state {
            ActorState::Alive => None,
            ActorState::Terminal(reason) => Some(reason),
        }
    }

    /// Enter a terminal state. The first reason wins.
    pub fn terminate(&mut self, reason: TerminalReason) {
        if self.is_alive() {
            self.state = ActorState::Terminal(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_kind_from_u8_treats_unknown_as_empty() {
        assert_eq!(TileKind::from_u8(1), TileKind::Solid);
        assert_eq!(TileKind::from_u8(2), TileKind::Hazard);
        assert_eq!(TileKind::from_u8(0), TileKind::Empty);
        assert_eq!(TileKind::from_u8(42), TileKind::Empty);
    }

    #[test]
    fn terminal_state_is_absorbing() {
        let mut actor = Actor::spawn(Vec2::new(10.0, 10.0), Vec2::new(18.0, 26.0));
        assert!(actor.is_alive());
        actor.terminate(TerminalReason::Hazard);
        actor.terminate(TerminalReason::Goal);
        assert_eq!(actor.terminal(), Some(TerminalReason::Hazard));
    }
}
