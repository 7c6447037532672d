use crate::domain::ports::ScoreSource;
use rand::Rng;

/// Draws placeholder credit scores from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngScore;

impl ScoreSource for ThreadRngScore {
    fn draw(&self) -> u8 {
        rand::thread_rng().gen_range(0..100)
    }
}
