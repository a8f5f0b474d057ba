use anyhow::Result;
use chrono::Locale;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table,
        TableState, Wrap,
    },
    Frame,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::PageAction;
use crate::api::{map_episodes, Episode, EpisodeApi, EpisodesQuery};
use crate::player::PlayerState;
use crate::settings::SettingsManager;
use crate::theme::ThemeManager;

/// Landing page: the newest releases as cards, the rest as a table.
pub struct HomePage {
    api: Arc<dyn EpisodeApi>,
    locale: Locale,
    listing_limit: usize,
    latest_count: usize,
    revalidate_after: Duration,

    // Data
    episodes: Vec<Episode>,
    fetched_at: Option<Instant>,

    // UI State
    selected: usize,
    loading: bool,
    error_message: Option<String>,

    // Theme management
    theme_manager: ThemeManager,
}

impl HomePage {
    pub fn new(api: Arc<dyn EpisodeApi>, settings: &SettingsManager) -> Self {
        let mut theme_manager = ThemeManager::new();
        theme_manager.set_theme(settings.theme_name());

        Self {
            api,
            locale: settings.locale(),
            listing_limit: settings.listing_limit(),
            latest_count: settings.latest_count(),
            revalidate_after: settings.revalidate_after(),
            episodes: Vec::new(),
            fetched_at: None,
            selected: 0,
            loading: false,
            error_message: None,
            theme_manager,
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        self.refresh().await
    }

    pub async fn refresh(&mut self) -> Result<()> {
        self.loading = true;
        self.error_message = None;

        let result = self
            .api
            .latest_episodes(EpisodesQuery::latest(self.listing_limit))
            .await;

        self.loading = false;
        self.fetched_at = Some(Instant::now());

        match result {
            Ok(raws) => {
                self.episodes = map_episodes(raws, self.locale);
                if self.selected >= self.episodes.len() {
                    self.selected = 0;
                }
                log::info!("Home page loaded {} episodes", self.episodes.len());
                Ok(())
            }
            Err(e) => {
                self.error_message = Some(format!("Failed to load episodes: {}", e));
                Err(e.into())
            }
        }
    }

    /// Refetches once the listing is older than the revalidate window.
    pub async fn update(&mut self) -> Result<()> {
        if self.is_stale() && !self.loading {
            log::debug!("Episode listing is stale, revalidating");
            self.refresh().await?;
        }
        Ok(())
    }

    fn is_stale(&self) -> bool {
        self.fetched_at
            .map_or(true, |fetched_at| fetched_at.elapsed() >= self.revalidate_after)
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    /// The first `latest_count` episodes.
    pub fn latest_episodes(&self) -> &[Episode] {
        &self.episodes[..self.split_at()]
    }

    /// Everything after the latest releases.
    pub fn all_episodes(&self) -> &[Episode] {
        &self.episodes[self.split_at()..]
    }

    fn split_at(&self) -> usize {
        self.latest_count.min(self.episodes.len())
    }

    pub fn selected_episode(&self) -> Option<&Episode> {
        self.episodes.get(self.selected)
    }

    pub fn handle_input(&mut self, key: KeyEvent, player: &mut PlayerState) -> PageAction {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.next_item(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_item(),
            KeyCode::Enter => {
                if let Some(episode) = self.selected_episode() {
                    return PageAction::OpenEpisode(episode.id.clone());
                }
            }
            KeyCode::Char('p') => self.play_selected(player),
            _ => {}
        }
        PageAction::None
    }

    /// Queues the whole listing and starts at the selected row, so the
    /// table rows continue after the latest releases.
    fn play_selected(&self, player: &mut PlayerState) {
        if self.episodes.is_empty() {
            return;
        }
        player.play_list(self.episodes.clone(), self.selected);
    }

    fn next_item(&mut self) {
        if !self.episodes.is_empty() {
            self.selected = (self.selected + 1) % self.episodes.len();
        }
    }

    fn previous_item(&mut self) {
        if !self.episodes.is_empty() {
            if self.selected == 0 {
                self.selected = self.episodes.len() - 1;
            } else {
                self.selected -= 1;
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, player: &PlayerState) {
        if self.loading {
            self.render_loading(frame, area);
            return;
        }

        if let Some(error) = &self.error_message {
            self.render_error(frame, area, error);
            return;
        }

        if self.episodes.is_empty() {
            self.render_empty(frame, area);
            return;
        }

        let latest_height = (self.latest_episodes().len() as u16) * 3 + 2;
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(latest_height), // Latest releases
                Constraint::Min(5),                // All episodes
            ])
            .split(area);

        self.render_latest(frame, layout[0], player);
        self.render_all(frame, layout[1], player);
    }

    fn playing_marker(&self, episode: &Episode, player: &PlayerState) -> &'static str {
        match player.current_episode() {
            Some(current) if current.id == episode.id => "▶ ",
            _ => "  ",
        }
    }

    fn render_latest(&self, frame: &mut Frame, area: Rect, player: &PlayerState) {
        let theme_colors = self.theme_manager.get_colors();
        let items: Vec<ListItem> = self
            .latest_episodes()
            .iter()
            .map(|episode| {
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(
                            self.playing_marker(episode, player),
                            Style::default().fg(theme_colors.accent),
                        ),
                        Span::styled(
                            episode.title.clone(),
                            Style::default().fg(theme_colors.text).add_modifier(Modifier::BOLD),
                        ),
                    ]),
                    Line::from(Span::styled(
                        format!("  {}", episode.members),
                        Style::default().fg(theme_colors.text_secondary),
                    )),
                    Line::from(Span::styled(
                        format!("  {} · {}", episode.published_at, episode.duration_as_string),
                        Style::default().fg(theme_colors.text_secondary),
                    )),
                ])
            })
            .collect();

        let split = self.split_at();
        let mut state = ListState::default().with_selected((self.selected < split).then_some(self.selected));

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title("🆕 Latest releases")
                    .border_style(Style::default().fg(theme_colors.border))
                    .title_style(Style::default().fg(theme_colors.primary).add_modifier(Modifier::BOLD)),
            )
            .highlight_style(
                Style::default()
                    .bg(theme_colors.highlight)
                    .add_modifier(Modifier::BOLD),
            );

        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_all(&self, frame: &mut Frame, area: Rect, player: &PlayerState) {
        let theme_colors = self.theme_manager.get_colors();

        let header = Row::new(vec!["Podcast", "Members", "Date", "Duration"])
            .style(Style::default().fg(theme_colors.text_secondary).add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = self
            .all_episodes()
            .iter()
            .map(|episode| {
                Row::new(vec![
                    Cell::from(format!("{}{}", self.playing_marker(episode, player), episode.title)),
                    Cell::from(episode.members.clone()),
                    Cell::from(episode.published_at.clone()),
                    Cell::from(episode.duration_as_string.clone()),
                ])
                .style(Style::default().fg(theme_colors.text))
            })
            .collect();

        let mut state = TableState::default().with_selected(self.selected.checked_sub(self.split_at()));

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(45),
                Constraint::Percentage(30),
                Constraint::Length(10),
                Constraint::Length(10),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title("📻 All episodes")
                .border_style(Style::default().fg(theme_colors.border))
                .title_style(Style::default().fg(theme_colors.primary).add_modifier(Modifier::BOLD)),
        )
        .row_highlight_style(
            Style::default()
                .bg(theme_colors.highlight)
                .add_modifier(Modifier::BOLD),
        );

        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let theme_colors = self.theme_manager.get_colors();
        let loading_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Loading...")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(theme_colors.accent));

        let loading_text = Paragraph::new("🔄 Loading the latest episodes...")
            .style(Style::default().fg(theme_colors.accent))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(loading_block);

        frame.render_widget(loading_text, area);
    }

    fn render_error(&self, frame: &mut Frame, area: Rect, error: &str) {
        let theme_colors = self.theme_manager.get_colors();
        let error_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Error")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(theme_colors.error));

        let error_text = Paragraph::new(format!("❌ {}\n\nPress Ctrl+R to retry", error))
            .style(Style::default().fg(theme_colors.error))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(error_block);

        frame.render_widget(error_text, area);
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect) {
        let theme_colors = self.theme_manager.get_colors();
        let empty_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title("Episodes")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(theme_colors.border));

        let empty_text = Paragraph::new("No episodes published yet.\n\nPress Ctrl+R to check again")
            .style(Style::default().fg(theme_colors.text_secondary))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(empty_block);

        frame.render_widget(empty_text, area);
    }
}
