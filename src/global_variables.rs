// Fixed geometry of the intersection, in world units.
pub const SCREEN_WIDTH: f64 = 900.0;
pub const SCREEN_HEIGHT: f64 = 700.0;
pub const CENTER_X: f64 = SCREEN_WIDTH / 2.0;
pub const CENTER_Y: f64 = SCREEN_HEIGHT / 2.0;

// Lateral distance of each lane from the center line.
pub const LANE_OFFSET: f64 = 80.0;
// Half width of the crossing box.
pub const CROSS_HALF: f64 = 120.0;
// Spacing between consecutive queue slots.
pub const QUEUE_GAP: f64 = 36.0;
// Gap between the crossing box edge and queue slot 0.
pub const QUEUE_HEAD_GAP: f64 = 12.0;
// How far past the crossing center a vehicle's crossing point lies.
pub const CROSSING_OVERSHOOT: f64 = 8.0;

// New vehicles appear this far outside the screen edge.
pub const ENTRY_MARGIN: f64 = 80.0;
// Exit points sit this far outside the screen edge.
pub const EXIT_MARGIN: f64 = 400.0;
// Anything further than this outside the screen is collected.
// Must stay below EXIT_MARGIN and above ENTRY_MARGIN.
pub const CLEANUP_MARGIN: f64 = 200.0;

// Distance under which a vehicle counts as arrived at a slot or crossing point.
pub const ARRIVAL_TOLERANCE: f64 = 6.0;

// Default timing, in ticks of the control loop.
pub const DEFAULT_TICK_MS: u64 = 60;
pub const DEFAULT_SPAWN_MS: u64 = 900;
pub const DEFAULT_NS_GREEN_TICKS: u32 = 200;
pub const DEFAULT_NS_YELLOW_TICKS: u32 = 36;
pub const DEFAULT_EW_GREEN_TICKS: u32 = 160;
pub const DEFAULT_EW_YELLOW_TICKS: u32 = 30;

pub const DEFAULT_WORKER_COUNT: usize = 4;
pub const DEFAULT_STEP_LENGTH: f64 = 5.0;
pub const DEFAULT_MAX_OCCUPANCY: usize = 3;

// Channel capacities.
pub const JOB_QUEUE_CAPACITY: usize = 512;
pub const RESULT_QUEUE_CAPACITY: usize = 512;
pub const SPAWN_QUEUE_CAPACITY: usize = 128;
pub const SNAPSHOT_QUEUE_CAPACITY: usize = 1;
