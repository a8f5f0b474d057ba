use rand::Rng;

use crate::api::Episode;

/// What is queued and how it is being played.
///
/// One instance lives for the whole session, owned by the application shell
/// and lent to pages and the player view. Out-of-contract navigation (next on
/// the last item, previous on the first, anything on an empty queue) leaves
/// the state untouched; the UI disables those controls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerState {
    episodes: Vec<Episode>,
    current_index: usize,
    is_playing: bool,
    is_looping: bool,
    is_shuffling: bool,
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_episode(&self) -> Option<&Episode> {
        self.episodes.get(self.current_index)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_looping(&self) -> bool {
        self.is_looping
    }

    pub fn is_shuffling(&self) -> bool {
        self.is_shuffling
    }

    pub fn has_next(&self) -> bool {
        (self.is_shuffling && !self.episodes.is_empty()) || self.current_index + 1 < self.episodes.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current_index > 0
    }

    /// Replaces the queue with a single episode and starts it.
    pub fn play(&mut self, episode: Episode) {
        log::info!("Playing episode: {}", episode.title);
        self.episodes = vec![episode];
        self.current_index = 0;
        self.is_playing = true;
    }

    /// Replaces the queue and starts at `index`, clamped into the list.
    pub fn play_list(&mut self, episodes: Vec<Episode>, index: usize) {
        let index = index.min(episodes.len().saturating_sub(1));
        log::info!("Playing list of {} episodes from #{}", episodes.len(), index);
        self.episodes = episodes;
        self.current_index = index;
        self.is_playing = true;
    }

    pub fn toggle_play(&mut self) {
        self.is_playing = !self.is_playing;
    }

    pub fn toggle_loop(&mut self) {
        self.is_looping = !self.is_looping;
    }

    pub fn toggle_shuffle(&mut self) {
        self.is_shuffling = !self.is_shuffling;
    }

    pub fn set_playing_state(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    pub fn play_next(&mut self) {
        self.play_next_with(&mut rand::rng());
    }

    /// Advances the queue. While shuffling any index may come up, including
    /// the current one.
    pub fn play_next_with<R: Rng>(&mut self, rng: &mut R) {
        if self.is_shuffling {
            if self.episodes.is_empty() {
                return;
            }
            self.current_index = rng.random_range(0..self.episodes.len());
        } else if self.has_next() {
            self.current_index += 1;
        }
    }

    /// Steps back one item. Shuffle does not apply here.
    pub fn play_previous(&mut self) {
        if self.has_previous() {
            self.current_index -= 1;
        }
    }

    pub fn clear_player_state(&mut self) {
        self.episodes.clear();
        self.current_index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::episodes::tests::episode;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn three() -> Vec<Episode> {
        vec![episode("e0"), episode("e1"), episode("e2")]
    }

    #[test]
    fn starts_empty_and_stopped() {
        let state = PlayerState::new();
        assert!(state.episodes().is_empty());
        assert_eq!(state.current_index(), 0);
        assert!(state.current_episode().is_none());
        assert!(!state.is_playing());
        assert!(!state.is_looping());
        assert!(!state.is_shuffling());
        assert!(!state.has_next());
        assert!(!state.has_previous());
    }

    #[test]
    fn play_replaces_queue_from_any_state() {
        let mut state = PlayerState::new();
        state.play_list(three(), 2);
        state.toggle_play();

        let single = episode("solo");
        state.play(single.clone());

        assert_eq!(state.episodes(), &[single.clone()]);
        assert_eq!(state.current_index(), 0);
        assert_eq!(state.current_episode(), Some(&single));
        assert!(state.is_playing());
    }

    #[test]
    fn play_list_then_next_reaches_the_end() {
        let mut state = PlayerState::new();
        state.play_list(three(), 1);
        assert!(state.is_playing());
        assert!(state.has_next());
        assert!(state.has_previous());

        state.play_next();
        assert_eq!(state.current_index(), 2);
        assert!(!state.has_next());

        // disabled control; nothing moves
        state.play_next();
        assert_eq!(state.current_index(), 2);
    }

    #[test]
    fn play_list_clamps_start_index() {
        let mut state = PlayerState::new();
        state.play_list(three(), 10);
        assert_eq!(state.current_index(), 2);

        state.play_list(Vec::new(), 3);
        assert_eq!(state.current_index(), 0);
        assert!(state.current_episode().is_none());
    }

    #[test]
    fn previous_steps_back_and_stops_at_zero() {
        let mut state = PlayerState::new();
        state.play_list(three(), 1);

        state.play_previous();
        assert_eq!(state.current_index(), 0);
        assert!(!state.has_previous());

        state.play_previous();
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn previous_ignores_shuffle() {
        let mut state = PlayerState::new();
        state.play_list(three(), 2);
        state.toggle_shuffle();

        state.play_previous();
        assert_eq!(state.current_index(), 1);
    }

    #[test]
    fn shuffle_always_has_next_on_a_non_empty_queue() {
        let mut state = PlayerState::new();
        state.toggle_shuffle();
        assert!(!state.has_next());

        state.play_list(three(), 2);
        assert!(state.has_next());
    }

    #[test]
    fn shuffle_picks_every_index_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = PlayerState::new();
        state.play_list(three(), 0);
        state.toggle_shuffle();

        let mut seen = [0usize; 3];
        for _ in 0..300 {
            state.play_next_with(&mut rng);
            assert!(state.current_index() < 3);
            seen[state.current_index()] += 1;
        }

        // Expect roughly 100 each; a generous tolerance keeps this stable
        for count in seen {
            assert!(count > 50, "{:?}", seen);
        }
    }

    #[test]
    fn shuffle_next_on_empty_queue_is_a_no_op() {
        let mut state = PlayerState::new();
        state.toggle_shuffle();
        state.play_next();
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn toggles_are_independent() {
        let mut state = PlayerState::new();
        state.toggle_loop();
        assert!(state.is_looping());
        assert!(!state.is_shuffling());
        assert!(!state.is_playing());

        state.toggle_shuffle();
        state.toggle_play();
        assert!(state.is_looping() && state.is_shuffling() && state.is_playing());

        state.toggle_loop();
        assert!(!state.is_looping());
        assert!(state.is_shuffling());
    }

    #[test]
    fn set_playing_state_is_explicit() {
        let mut state = PlayerState::new();
        state.set_playing_state(true);
        state.set_playing_state(true);
        assert!(state.is_playing());
        state.set_playing_state(false);
        assert!(!state.is_playing());
    }

    #[test]
    fn clear_empties_queue_from_any_state() {
        let mut state = PlayerState::new();
        state.play_list(three(), 2);
        state.toggle_loop();

        state.clear_player_state();

        assert!(state.episodes().is_empty());
        assert_eq!(state.current_index(), 0);
        assert!(state.current_episode().is_none());
        assert!(state.is_looping());
    }
}
