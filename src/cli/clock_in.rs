//! Clock-in commands: `clock-in`, `today`, `week` and `goal`.

use serde::Serialize;

use crate::config::Config;
use crate::core::{
    ClockInDay, ClockInEngine, ClockInState, ClockInSummary, Clock, LearningGoal, UserId,
};
use crate::error::Result;
use crate::storage::{ClockInStore, GoalStore, ProgressStore};

/// Output for `clock-in` and `today`.
#[derive(Debug, Clone, Serialize)]
pub struct TodayOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub today: ClockInSummary,
    /// Streak including today once today is achieved.
    pub current_streak: u32,
}

impl TodayOutput {
    fn new(today: ClockInSummary) -> Self {
        Self {
            success: true,
            current_streak: today.current_streak(),
            today,
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        let t = &self.today;
        let headline = match t.state {
            ClockInState::Achieved => "Daily goal achieved!".to_string(),
            _ => format!(
                "Keep going: {} new and {} reviews to go.",
                t.new_words_remaining(),
                t.review_words_remaining()
            ),
        };
        let mut lines = vec![format!("{} on {}", t.user_id, t.day), headline];
        lines.push(format!(
            "  New words: {}/{}",
            t.new_words_completed, t.new_words_target
        ));
        lines.push(format!(
            "  Reviews:   {}/{}",
            t.review_words_completed, t.review_words_target
        ));
        lines.push(format!("  Streak:    {} day(s)", self.current_streak));
        lines.join("\n")
    }
}

/// Output for `week`.
#[derive(Debug, Clone, Serialize)]
pub struct WeekOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub user_id: UserId,
    /// Today first.
    pub days: Vec<ClockInDay>,
    pub achieved_days: usize,
}

impl WeekOutput {
    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        let mut lines = vec![format!(
            "Last {} days for {} ({} achieved):",
            self.days.len(),
            self.user_id,
            self.achieved_days
        )];
        lines.push(String::new());
        lines.push(format!(
            "{:<10}  {:<11}  {:>5}  {:>7}  {:>6}",
            "DAY", "STATE", "NEW", "REVIEWS", "STREAK"
        ));
        lines.push("-".repeat(48));
        for day in &self.days {
            lines.push(format!(
                "{:<10}  {:<11}  {:>5}  {:>7}  {:>6}",
                day.day.format("%Y-%m-%d"),
                day.state.label(),
                day.new_words_completed,
                day.review_words_completed,
                day.streak_days
            ));
        }
        lines.join("\n")
    }
}

/// Output for `goal`.
#[derive(Debug, Clone, Serialize)]
pub struct GoalOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub goal: LearningGoal,
    /// True when this invocation changed the goal.
    pub updated: bool,
}

impl GoalOutput {
    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        let source = if self.updated {
            "Goal updated"
        } else if self.goal.is_explicit() {
            "Current goal"
        } else {
            "Default goal"
        };
        format!(
            "{} for {}: {} new words and {} reviews per day.",
            source,
            self.goal.user_id,
            self.goal.daily_new_words_goal,
            self.goal.daily_review_words_goal
        )
    }
}

/// The clock-in command implementation.
pub struct ClockInCommand<S, C> {
    engine: ClockInEngine<S, C>,
}

impl<S, C> ClockInCommand<S, C>
where
    S: ProgressStore + ClockInStore + GoalStore,
    C: Clock,
{
    /// Create a new clock-in command with default goals from `config`.
    pub fn new(store: S, clock: C, config: &Config) -> Self {
        Self {
            engine: ClockInEngine::new(store, clock)
                .with_default_goal(config.goals.daily_new_words, config.goals.daily_review_words),
        }
    }

    /// Recount today's work and clock in if both goals are met.
    pub fn clock_in(&self, user_id: &UserId) -> Result<TodayOutput> {
        let record = self.engine.try_clock_in(user_id)?;
        Ok(TodayOutput::new(ClockInSummary::from(&record)))
    }

    /// Today's record as it stands.
    pub fn today(&self, user_id: &UserId) -> Result<TodayOutput> {
        Ok(TodayOutput::new(self.engine.clock_in_summary(user_id)?))
    }

    /// The trailing week, today first.
    pub fn week(&self, user_id: &UserId) -> Result<WeekOutput> {
        let days = self.engine.weekly_history(user_id)?;
        Ok(WeekOutput {
            success: true,
            user_id: user_id.clone(),
            achieved_days: days.iter().filter(|d| d.state.is_achieved()).count(),
            days,
        })
    }

    /// Show the goal, or change it when both targets are given.
    ///
    /// Giving only one target keeps the other at its current value.
    pub fn goal(
        &self,
        user_id: &UserId,
        new_words: Option<i64>,
        review_words: Option<i64>,
    ) -> Result<GoalOutput> {
        let current = self.engine.learning_goal(user_id)?;
        if new_words.is_none() && review_words.is_none() {
            return Ok(GoalOutput {
                success: true,
                goal: current,
                updated: false,
            });
        }

        let goal = self.engine.set_learning_goal(
            user_id,
            new_words.unwrap_or(i64::from(current.daily_new_words_goal)),
            review_words.unwrap_or(i64::from(current.daily_review_words_goal)),
        )?;
        Ok(GoalOutput {
            success: true,
            goal,
            updated: true,
        })
    }
}
