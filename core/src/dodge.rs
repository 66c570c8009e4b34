pub const DODGE_RADIUS_DEFAULT: f64 = 150.0;
pub const TOTAL_DURATION_MS_DEFAULT: f64 = 35_000.0;
pub const ON_PHASE_MS_DEFAULT: f64 = 5_000.0;
pub const OFF_PHASE_MS_DEFAULT: f64 = 2_000.0;
pub const MIN_DISPLACEMENT_DEFAULT: f64 = 100.0;
pub const RELOCATE_ATTEMPTS_DEFAULT: u32 = 10;
pub const THROTTLE_MS_DEFAULT: f64 = 350.0;
pub const SWAP_RESTORE_MS_DEFAULT: u32 = 800;
pub const SCALE_RESTORE_MS_DEFAULT: u32 = 300;

pub const SPIN_DEG: f64 = 360.0;
pub const DOUBLE_SPIN_DEG: f64 = 720.0;
pub const SHRINK_SCALE: f64 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DodgeTuning {
    pub dodge_radius: f64,
    pub total_duration_ms: f64,
    pub on_phase_ms: f64,
    pub off_phase_ms: f64,
    pub min_displacement: f64,
    pub relocate_attempts: u32,
    pub throttle_ms: f64,
    pub swap_restore_ms: u32,
    pub scale_restore_ms: u32,
}

impl Default for DodgeTuning {
    fn default() -> Self {
        Self {
            dodge_radius: DODGE_RADIUS_DEFAULT,
            total_duration_ms: TOTAL_DURATION_MS_DEFAULT,
            on_phase_ms: ON_PHASE_MS_DEFAULT,
            off_phase_ms: OFF_PHASE_MS_DEFAULT,
            min_displacement: MIN_DISPLACEMENT_DEFAULT,
            relocate_attempts: RELOCATE_ATTEMPTS_DEFAULT,
            throttle_ms: THROTTLE_MS_DEFAULT,
            swap_restore_ms: SWAP_RESTORE_MS_DEFAULT,
            scale_restore_ms: SCALE_RESTORE_MS_DEFAULT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DodgePhase {
    Evasive { reactive: bool },
    Settled,
}

pub fn phase_at(elapsed_ms: f64, tuning: &DodgeTuning) -> DodgePhase {
    if elapsed_ms >= tuning.total_duration_ms {
        return DodgePhase::Settled;
    }
    let elapsed_ms = elapsed_ms.max(0.0);
    let cycle = tuning.on_phase_ms + tuning.off_phase_ms;
    if cycle <= 0.0 || tuning.on_phase_ms <= 0.0 {
        return DodgePhase::Evasive { reactive: true };
    }
    let into_cycle = elapsed_ms % cycle;
    DodgePhase::Evasive {
        reactive: into_cycle < tuning.on_phase_ms,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DodgeField {
    pub container: Size,
    pub button: Size,
}

impl DodgeField {
    pub fn new(container: Size, button: Size) -> Self {
        Self { container, button }
    }

    pub fn measured(&self) -> bool {
        self.container.width > 0.0
            && self.container.height > 0.0
            && self.button.width > 0.0
            && self.button.height > 0.0
    }

    fn max_offset(&self) -> (f64, f64) {
        (
            (self.container.width - self.button.width).max(0.0),
            (self.container.height - self.button.height).max(0.0),
        )
    }

    pub fn center(&self) -> Point {
        let (max_x, max_y) = self.max_offset();
        Point::new(max_x / 2.0, max_y / 2.0)
    }

    pub fn clamp(&self, position: Point) -> Point {
        let (max_x, max_y) = self.max_offset();
        Point::new(position.x.clamp(0.0, max_x), position.y.clamp(0.0, max_y))
    }

    pub fn contains(&self, position: Point) -> bool {
        let (max_x, max_y) = self.max_offset();
        position.x >= 0.0 && position.x <= max_x && position.y >= 0.0 && position.y <= max_y
    }

    pub fn button_center(&self, position: Point) -> Point {
        Point::new(
            position.x + self.button.width / 2.0,
            position.y + self.button.height / 2.0,
        )
    }
}

pub fn relocate(
    current: Point,
    field: &DodgeField,
    tuning: &DodgeTuning,
    rng: &mut dyn FnMut() -> f64,
) -> Point {
    if !field.measured() {
        return current;
    }
    let (max_x, max_y) = field.max_offset();
    let mut farthest: Option<(f64, Point)> = None;
    for _ in 0..tuning.relocate_attempts.max(1) {
        let candidate = field.clamp(Point::new(rng() * max_x, rng() * max_y));
        let displacement = current.distance(candidate);
        if displacement >= tuning.min_displacement {
            return candidate;
        }
        match farthest {
            Some((best, _)) if best >= displacement => {}
            _ => farthest = Some((displacement, candidate)),
        }
    }
    farthest.map(|(_, candidate)| candidate).unwrap_or(current)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DodgeBehavior {
    Relocate,
    SpinAway,
    DoubleSpinAway,
    ShrinkAway,
    SwapWithCompanion,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BehaviorTable {
    entries: Vec<(DodgeBehavior, f64)>,
    total: f64,
}

impl BehaviorTable {
    pub fn new(entries: Vec<(DodgeBehavior, f64)>) -> Self {
        let entries: Vec<_> = entries
            .into_iter()
            .filter(|(_, weight)| *weight > 0.0)
            .collect();
        let total = entries.iter().map(|(_, weight)| weight).sum();
        Self { entries, total }
    }

    pub fn choose(&self, roll: f64) -> DodgeBehavior {
        if self.entries.is_empty() || self.total <= 0.0 {
            return DodgeBehavior::Relocate;
        }
        let target = roll.clamp(0.0, 1.0) * self.total;
        let mut cumulative = 0.0;
        for (behavior, weight) in &self.entries {
            cumulative += weight;
            if target < cumulative {
                return *behavior;
            }
        }
        self.entries[self.entries.len() - 1].0
    }
}

impl Default for BehaviorTable {
    fn default() -> Self {
        Self::new(vec![
            (DodgeBehavior::SpinAway, 0.2),
            (DodgeBehavior::ShrinkAway, 0.2),
            (DodgeBehavior::DoubleSpinAway, 0.2),
            (DodgeBehavior::Relocate, 0.2),
            (DodgeBehavior::SwapWithCompanion, 0.2),
        ])
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DodgeThrottle {
    last_ms: Option<f64>,
}

impl DodgeThrottle {
    pub fn try_accept(&mut self, now_ms: f64, throttle_ms: f64) -> bool {
        if let Some(last) = self.last_ms {
            if now_ms - last < throttle_ms {
                return false;
            }
        }
        self.last_ms = Some(now_ms);
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DodgeReaction {
    Ignored,
    Dodge {
        to: Point,
        spin_deg: f64,
        shrink: bool,
    },
    Swap,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActivationOutcome {
    Invoke,
    Suppressed(DodgeReaction),
    Inert,
}

pub struct DodgeEngine {
    tuning: DodgeTuning,
    table: BehaviorTable,
    field: DodgeField,
    position: Option<Point>,
    throttle: DodgeThrottle,
    settled: bool,
}

impl DodgeEngine {
    pub fn new(tuning: DodgeTuning) -> Self {
        Self::with_table(tuning, BehaviorTable::default())
    }

    pub fn with_table(tuning: DodgeTuning, table: BehaviorTable) -> Self {
        Self {
            tuning,
            table,
            field: DodgeField::default(),
            position: None,
            throttle: DodgeThrottle::default(),
            settled: false,
        }
    }

    pub fn tuning(&self) -> &DodgeTuning {
        &self.tuning
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn measured(&self) -> bool {
        self.field.measured()
    }

    // Centers on the first complete measurement, re-clamps on later ones.
    // Returns the position only when it changed.
    pub fn measure(&mut self, container: Size, button: Size) -> Option<Point> {
        let field = DodgeField::new(container, button);
        if !field.measured() {
            return None;
        }
        self.field = field;
        let next = match self.position {
            None => field.center(),
            Some(current) => field.clamp(current),
        };
        if self.position == Some(next) {
            return None;
        }
        self.position = Some(next);
        Some(next)
    }

    pub fn advance(&mut self, elapsed_ms: f64) -> DodgePhase {
        if self.settled {
            return DodgePhase::Settled;
        }
        let phase = phase_at(elapsed_ms, &self.tuning);
        if phase == DodgePhase::Settled {
            self.settled = true;
        }
        phase
    }

    pub fn pointer_near(
        &mut self,
        pointer: Point,
        elapsed_ms: f64,
        rng: &mut dyn FnMut() -> f64,
    ) -> DodgeReaction {
        if self.advance(elapsed_ms) != (DodgePhase::Evasive { reactive: true }) {
            return DodgeReaction::Ignored;
        }
        let Some(position) = self.position else {
            return DodgeReaction::Ignored;
        };
        if !self.field.measured() {
            return DodgeReaction::Ignored;
        }
        if pointer.distance(self.field.button_center(position)) >= self.tuning.dodge_radius {
            return DodgeReaction::Ignored;
        }
        if !self.throttle.try_accept(elapsed_ms, self.tuning.throttle_ms) {
            return DodgeReaction::Ignored;
        }
        self.dodge(rng)
    }

    pub fn activation(
        &mut self,
        elapsed_ms: f64,
        rng: &mut dyn FnMut() -> f64,
    ) -> ActivationOutcome {
        match self.advance(elapsed_ms) {
            DodgePhase::Settled => ActivationOutcome::Invoke,
            DodgePhase::Evasive { reactive: false } => ActivationOutcome::Inert,
            DodgePhase::Evasive { reactive: true } => {
                if self.position.is_none() || !self.field.measured() {
                    return ActivationOutcome::Suppressed(DodgeReaction::Ignored);
                }
                if !self.throttle.try_accept(elapsed_ms, self.tuning.throttle_ms) {
                    return ActivationOutcome::Suppressed(DodgeReaction::Ignored);
                }
                ActivationOutcome::Suppressed(self.dodge(rng))
            }
        }
    }

    // Plain reposition, used when a swap has no measured companion to target.
    pub fn force_relocate(&mut self, rng: &mut dyn FnMut() -> f64) -> DodgeReaction {
        let Some(current) = self.position else {
            return DodgeReaction::Ignored;
        };
        let next = relocate(current, &self.field, &self.tuning, rng);
        self.position = Some(next);
        DodgeReaction::Dodge {
            to: next,
            spin_deg: 0.0,
            shrink: false,
        }
    }

    fn dodge(&mut self, rng: &mut dyn FnMut() -> f64) -> DodgeReaction {
        let Some(current) = self.position else {
            return DodgeReaction::Ignored;
        };
        let behavior = self.table.choose(rng());
        if behavior == DodgeBehavior::SwapWithCompanion {
            return DodgeReaction::Swap;
        }
        let next = relocate(current, &self.field, &self.tuning, rng);
        self.position = Some(next);
        let (spin_deg, shrink) = match behavior {
            DodgeBehavior::SpinAway => (SPIN_DEG, false),
            DodgeBehavior::DoubleSpinAway => (DOUBLE_SPIN_DEG, false),
            DodgeBehavior::ShrinkAway => (0.0, true),
            _ => (0.0, false),
        };
        DodgeReaction::Dodge {
            to: next,
            spin_deg,
            shrink,
        }
    }
}
