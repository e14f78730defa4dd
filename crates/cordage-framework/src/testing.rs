//! In-memory [`CommandApi`] used by the test suites.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use cordage_core::{ApiError, ApiResult, CommandApi, CommandSpec, Snowflake};
use parking_lot::Mutex;

#[derive(Default)]
struct State {
    global: Vec<CommandSpec>,
    guilds: HashMap<Snowflake, Vec<CommandSpec>>,
    failing: HashSet<Snowflake>,
    replace_calls: usize,
}

/// Remote command store with a call counter and per-guild failure injection.
#[derive(Default)]
pub(crate) struct MockApi {
    state: Mutex<State>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(&self) -> Vec<CommandSpec> {
        self.state.lock().global.clone()
    }

    pub fn guild(&self, guild: impl Into<Snowflake>) -> Vec<CommandSpec> {
        self.state
            .lock()
            .guilds
            .get(&guild.into())
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_global(&self, commands: Vec<CommandSpec>) {
        self.state.lock().global = commands;
    }

    /// Makes every call touching `guild` fail.
    pub fn fail_guild(&self, guild: impl Into<Snowflake>) {
        self.state.lock().failing.insert(guild.into());
    }

    pub fn replace_calls(&self) -> usize {
        self.state.lock().replace_calls
    }

    fn check(state: &State, guild: Snowflake) -> ApiResult<()> {
        if state.failing.contains(&guild) {
            return Err(ApiError::http(403, "Missing Access"));
        }
        Ok(())
    }
}

#[async_trait]
impl CommandApi for MockApi {
    async fn replace_global_commands(&self, commands: Vec<CommandSpec>) -> ApiResult<Vec<CommandSpec>> {
        let mut state = self.state.lock();
        state.replace_calls += 1;
        state.global = commands.clone();
        Ok(commands)
    }

    async fn replace_guild_commands(
        &self,
        guild_id: Snowflake,
        commands: Vec<CommandSpec>,
    ) -> ApiResult<Vec<CommandSpec>> {
        let mut state = self.state.lock();
        state.replace_calls += 1;
        Self::check(&state, guild_id)?;
        state.guilds.insert(guild_id, commands.clone());
        Ok(commands)
    }

    async fn get_global_commands(&self) -> ApiResult<Vec<CommandSpec>> {
        Ok(self.global())
    }

    async fn get_guild_commands(&self, guild_id: Snowflake) -> ApiResult<Vec<CommandSpec>> {
        let state = self.state.lock();
        Self::check(&state, guild_id)?;
        Ok(state.guilds.get(&guild_id).cloned().unwrap_or_default())
    }
}
