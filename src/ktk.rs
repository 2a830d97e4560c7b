//! Kill The King, the reference game of the comparison.
//!
//! Each player owns a King, a Warrior, an Archer and a Healer on a square
//! board. A decision moves exactly one unit: the acting unit cycles
//! King → Warrior → Archer → Healer, after which the other player takes over
//! and the turn counter increments. The game ends when a king dies or when
//! the turn cap is reached, in which case the side with more living units
//! wins.

use std::fmt;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::{opponent, Game, MctsError, Player, Result};

/// Position on the board as `(row, column)`.
pub type Cell = (usize, usize);

const UNITS_PER_PLAYER: usize = 4;

/// Sum of the maximum health of one player's units.
const FULL_HEALTH: f64 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    King,
    Warrior,
    Archer,
    Healer,
}

impl UnitKind {
    /// Kinds in acting order.
    pub const ALL: [UnitKind; UNITS_PER_PLAYER] =
        [UnitKind::King, UnitKind::Warrior, UnitKind::Archer, UnitKind::Healer];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    pub fn max_health(self) -> u8 {
        match self {
            UnitKind::King | UnitKind::Warrior => 2,
            UnitKind::Archer | UnitKind::Healer => 1,
        }
    }

    /// Chebyshev attack range, `None` for units that cannot attack.
    pub fn attack_range(self) -> Option<usize> {
        match self {
            UnitKind::King | UnitKind::Warrior => Some(1),
            UnitKind::Archer => Some(2),
            UnitKind::Healer => None,
        }
    }

    fn symbol(self, owner: Player) -> char {
        let symbol = match self {
            UnitKind::King => 'K',
            UnitKind::Warrior => 'W',
            UnitKind::Archer => 'A',
            UnitKind::Healer => 'H',
        };
        if owner == 0 { symbol } else { symbol.to_ascii_lowercase() }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One unit. A unit at zero health is dead and no longer occupies its cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    kind: UnitKind,
    owner: Player,
    cell: Cell,
    health: u8,
}

impl Unit {
    fn new(kind: UnitKind, owner: Player, cell: Cell) -> Self {
        Unit {
            kind,
            owner,
            cell,
            health: kind.max_health(),
        }
    }

    #[inline]
    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    #[inline]
    pub fn owner(&self) -> Player {
        self.owner
    }

    #[inline]
    pub fn cell(&self) -> Cell {
        self.cell
    }

    #[inline]
    pub fn health(&self) -> u8 {
        self.health
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Snapshot of a Kill The King game.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KtkState {
    size: usize,
    units: [Unit; 2 * UNITS_PER_PLAYER],
    player: Player,
    phase: usize,
    turn: usize,
}

impl KtkState {
    fn from_cells(size: usize, cells: [[Cell; UNITS_PER_PLAYER]; 2]) -> Self {
        let unit = |owner: Player, kind: UnitKind| Unit::new(kind, owner, cells[owner as usize][kind.index()]);
        KtkState {
            size,
            units: [
                unit(0, UnitKind::King),
                unit(0, UnitKind::Warrior),
                unit(0, UnitKind::Archer),
                unit(0, UnitKind::Healer),
                unit(1, UnitKind::King),
                unit(1, UnitKind::Warrior),
                unit(1, UnitKind::Archer),
                unit(1, UnitKind::Healer),
            ],
            player: 0,
            phase: 0,
            turn: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Player whose unit acts next.
    #[inline]
    pub fn player(&self) -> Player {
        self.player
    }

    /// Kind of the unit acting next.
    #[inline]
    pub fn phase(&self) -> UnitKind {
        UnitKind::ALL[self.phase]
    }

    /// Completed turns; a turn is one full unit cycle of one player.
    #[inline]
    pub fn turn(&self) -> usize {
        self.turn
    }

    #[inline]
    pub fn unit(&self, owner: Player, kind: UnitKind) -> &Unit {
        &self.units[owner as usize * UNITS_PER_PLAYER + kind.index()]
    }

    fn unit_mut(&mut self, owner: Player, kind: UnitKind) -> &mut Unit {
        &mut self.units[owner as usize * UNITS_PER_PLAYER + kind.index()]
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Living unit standing on `cell`.
    pub fn occupant(&self, cell: Cell) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.is_alive() && unit.cell == cell)
    }

    pub fn living(&self, owner: Player) -> usize {
        self.units
            .iter()
            .filter(|unit| unit.owner == owner && unit.is_alive())
            .count()
    }

    fn total_health(&self, owner: Player) -> u8 {
        self.units
            .iter()
            .filter(|unit| unit.owner == owner)
            .map(|unit| unit.health)
            .sum()
    }

    /// Health balance for `perspective`, normalised by a full side's health.
    fn material(&self, perspective: Player) -> f64 {
        (self.total_health(perspective) as f64 - self.total_health(opponent(perspective)) as f64) / FULL_HEALTH
    }

    fn advance(&mut self) {
        self.phase += 1;
        if self.phase == UNITS_PER_PLAYER {
            self.phase = 0;
            self.player = opponent(self.player);
            self.turn += 1;
        }
    }
}

impl fmt::Display for KtkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            for col in 0..self.size {
                let symbol = self
                    .occupant((row, col))
                    .map_or('.', |unit| unit.kind.symbol(unit.owner));
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        write!(f, "turn {} player {} {}", self.turn, self.player, self.phase())
    }
}

/// A decision of the acting unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KtkAction {
    Move { unit: UnitKind, to: Cell },
    Attack { unit: UnitKind, target: UnitKind },
    Heal { target: UnitKind },
    Wait { unit: UnitKind },
}

impl KtkAction {
    /// Bit identifying the kind of action in a signature.
    fn kind_bit(&self) -> u64 {
        match self {
            KtkAction::Move { .. } => 1,
            KtkAction::Attack { .. } => 2,
            KtkAction::Heal { .. } => 4,
            KtkAction::Wait { .. } => 8,
        }
    }
}

impl fmt::Display for KtkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KtkAction::Move { unit, to: (row, col) } => write!(f, "{unit} moves to ({row}, {col})"),
            KtkAction::Attack { unit, target } => write!(f, "{unit} attacks {target}"),
            KtkAction::Heal { target } => write!(f, "Healer heals {target}"),
            KtkAction::Wait { unit } => write!(f, "{unit} waits"),
        }
    }
}

/// Rules of a Kill The King board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KtkConfig {
    pub board_size: usize,

    /// Turn at which the game is decided by counting living units.
    pub max_turns: usize,

    /// Start from a seeded random setup instead of the fixed corners.
    pub random_setup: bool,
}

impl Default for KtkConfig {
    fn default() -> Self {
        KtkConfig {
            board_size: 4,
            max_turns: 20,
            random_setup: true,
        }
    }
}

impl KtkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.board_size < 4 {
            return Err(MctsError::invalid(format!(
                "board_size must be at least 4, got {}",
                self.board_size
            )));
        }
        if self.max_turns == 0 {
            return Err(MctsError::invalid("max_turns must be at least 1"));
        }
        Ok(())
    }
}

/// Kill The King rules. The game value only holds the board size and turn
/// cap; every transition returns a fresh [`KtkState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KillTheKing {
    board_size: usize,
    max_turns: usize,
}

impl Default for KillTheKing {
    fn default() -> Self {
        KillTheKing {
            board_size: 4,
            max_turns: 20,
        }
    }
}

impl KillTheKing {
    /// # Errors
    /// [`MctsError::InvalidConfiguration`] for boards smaller than 4×4 or a zero turn cap.
    pub fn new(board_size: usize, max_turns: usize) -> Result<Self> {
        Self::from_config(&KtkConfig {
            board_size,
            max_turns,
            random_setup: false,
        })
    }

    pub fn from_config(config: &KtkConfig) -> Result<Self> {
        config.validate()?;
        Ok(KillTheKing {
            board_size: config.board_size,
            max_turns: config.max_turns,
        })
    }

    #[inline]
    pub fn board_size(&self) -> usize {
        self.board_size
    }

    #[inline]
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Side of the square corner territory each player starts in.
    fn territory(&self) -> usize {
        (self.board_size / 3).max(2)
    }

    /// Shuffles each player's units inside its corner territory. The king is
    /// placed on the half of the territory closer to the board corner.
    pub fn random_state<R: Rng + ?Sized>(&self, rng: &mut R) -> KtkState {
        let size = self.board_size;
        let territory = self.territory();
        let far = size - territory;

        let near_corner: Vec<Cell> = (0..territory)
            .flat_map(|row| (0..territory).map(move |col| (row, col)))
            .collect();
        let far_corner: Vec<Cell> = (far..size)
            .flat_map(|row| (far..size).map(move |col| (row, col)))
            .collect();

        let first = Self::shuffle_territory(near_corner, |(row, col)| row + col <= territory, rng);
        let second = Self::shuffle_territory(far_corner, |(row, col)| row + col + territory + 1 >= 2 * size, rng);
        KtkState::from_cells(size, [first, second])
    }

    fn shuffle_territory<R: Rng + ?Sized>(
        mut cells: Vec<Cell>,
        safe: impl Fn(Cell) -> bool,
        rng: &mut R,
    ) -> [Cell; UNITS_PER_PLAYER] {
        cells.shuffle(rng);
        let king = cells.iter().position(|&cell| safe(cell)).unwrap_or(0);
        let king = cells.remove(king);
        [king, cells[0], cells[1], cells[2]]
    }

    /// Winner of a terminal state; `None` for a draw or a game still running.
    pub fn winner(&self, state: &KtkState) -> Option<Player> {
        for player in [0, 1] {
            if !state.unit(player, UnitKind::King).is_alive() {
                return Some(opponent(player));
            }
        }
        if state.turn < self.max_turns {
            return None;
        }
        match state.living(0).cmp(&state.living(1)) {
            std::cmp::Ordering::Greater => Some(0),
            std::cmp::Ordering::Less => Some(1),
            std::cmp::Ordering::Equal => None,
        }
    }

    fn in_range(size: usize, (row, col): Cell, range: usize) -> impl Iterator<Item = Cell> {
        let rows = row.saturating_sub(range)..=(row + range).min(size - 1);
        rows.flat_map(move |r| {
            (col.saturating_sub(range)..=(col + range).min(size - 1)).map(move |c| (r, c))
        })
        .filter(move |&cell| cell != (row, col))
    }
}

impl Game for KillTheKing {
    type State = KtkState;
    type Action = KtkAction;

    /// Fixed setup: player 0 in the top-left corner, player 1 mirrored in
    /// the bottom-right corner.
    fn initial_state(&self) -> Self::State {
        let last = self.board_size - 1;
        KtkState::from_cells(
            self.board_size,
            [
                [(0, 0), (1, 0), (0, 1), (1, 1)],
                [(last, last), (last - 1, last), (last, last - 1), (last - 1, last - 1)],
            ],
        )
    }

    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action> {
        if self.is_terminal(state) {
            return Vec::new();
        }

        let player = state.player;
        let kind = state.phase();
        let unit = state.unit(player, kind);
        if !unit.is_alive() {
            return vec![KtkAction::Wait { unit: kind }];
        }

        let (row, col) = unit.cell;
        let size = state.size;
        let mut actions = Vec::new();

        let neighbours = [
            row.checked_sub(1).map(|r| (r, col)),
            (row + 1 < size).then_some((row + 1, col)),
            col.checked_sub(1).map(|c| (row, c)),
            (col + 1 < size).then_some((row, col + 1)),
        ];
        for to in neighbours.into_iter().flatten() {
            if state.occupant(to).is_none() {
                actions.push(KtkAction::Move { unit: kind, to });
            }
        }

        if let Some(range) = kind.attack_range() {
            for cell in Self::in_range(size, unit.cell, range) {
                if let Some(target) = state.occupant(cell).filter(|target| target.owner != player) {
                    actions.push(KtkAction::Attack {
                        unit: kind,
                        target: target.kind,
                    });
                }
            }
        }

        if kind == UnitKind::Healer {
            for cell in Self::in_range(size, unit.cell, 1) {
                if let Some(target) = state
                    .occupant(cell)
                    .filter(|target| target.owner == player && target.health < target.kind.max_health())
                {
                    actions.push(KtkAction::Heal { target: target.kind });
                }
            }
        }

        if actions.is_empty() {
            actions.push(KtkAction::Wait { unit: kind });
        }
        actions
    }

    /// # Panics
    /// If `action` is not legal in `state`.
    fn step(&self, state: &Self::State, action: &Self::Action) -> Self::State {
        assert!(
            self.legal_actions(state).contains(action),
            "illegal action {action} in\n{state}"
        );

        let player = state.player;
        let mut next = state.clone();
        match *action {
            KtkAction::Move { unit, to } => next.unit_mut(player, unit).cell = to,
            KtkAction::Attack { target, .. } => {
                let target = next.unit_mut(opponent(player), target);
                target.health = target.health.saturating_sub(1);
            }
            KtkAction::Heal { target } => {
                let target = next.unit_mut(player, target);
                target.health = (target.health + 1).min(target.kind.max_health());
            }
            KtkAction::Wait { .. } => {}
        }
        next.advance();
        next
    }

    fn is_terminal(&self, state: &Self::State) -> bool {
        state.turn >= self.max_turns
            || !state.unit(0, UnitKind::King).is_alive()
            || !state.unit(1, UnitKind::King).is_alive()
    }

    /// Health balance gained by `action`, plus the final outcome when the
    /// action ends the game.
    fn reward(&self, state: &Self::State, action: &Self::Action, perspective: Player) -> f64 {
        let next = self.step(state, action);
        let mut reward = next.material(perspective) - state.material(perspective);
        if self.is_terminal(&next) {
            reward += self.evaluate(&next, perspective);
        }
        reward
    }

    fn current_player(&self, state: &Self::State) -> Player {
        state.player
    }

    fn evaluate(&self, state: &Self::State, perspective: Player) -> f64 {
        if self.is_terminal(state) {
            return match self.winner(state) {
                Some(winner) if winner == perspective => 1.0,
                Some(_) => -1.0,
                None => 0.0,
            };
        }
        (state.living(perspective) as f64 - state.living(opponent(perspective)) as f64)
            / (2 * UNITS_PER_PLAYER) as f64
    }

    fn is_priority(&self, action: &Self::Action) -> bool {
        matches!(action, KtkAction::Attack { .. })
    }

    /// Packs the player, the unit phase and the kinds of available actions.
    fn signature(&self, state: &Self::State) -> u64 {
        let kinds = self
            .legal_actions(state)
            .iter()
            .fold(0, |mask, action| mask | action.kind_bit());
        state.player as u64 | (state.phase as u64) << 1 | kinds << 3
    }
}
