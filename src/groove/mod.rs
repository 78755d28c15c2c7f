// Groove - Musical timing
// Beat grid and tempo conversion used by every track builder

pub mod clock;

pub use clock::{time_of, BeatClock, BEATS_PER_BAR};
