// paginator.rs - Reaction-driven paged embeds
// Sends the first page of a sequence and registers reaction subscriptions
// that flip through the rest by editing the message in place.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::context::Context;
use crate::error::PaginatorError;
use crate::model::{ChannelId, MessageId, Page, PageField};
use crate::reactions::{callback, ReactionCallback, SubscriptionOptions};

pub const CANCEL: &str = "❌";
pub const FIRST: &str = "⏪";
pub const PREVIOUS: &str = "⬅️";
pub const NEXT: &str = "➡️";
pub const LAST: &str = "⏩";

/// Cursor over a non-empty page sequence
#[derive(Debug, Clone)]
pub struct PaginationState {
    cursor: usize,
    pages: Vec<Page>,
}

impl PaginationState {
    /// `pages` must not be empty
    fn new(pages: Vec<Page>) -> Self {
        PaginationState { cursor: 0, pages }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn current(&self) -> &Page {
        &self.pages[self.cursor]
    }

    pub fn next(&mut self) {
        self.cursor = (self.cursor + 1) % self.pages.len();
    }

    pub fn previous(&mut self) {
        self.cursor = match self.cursor {
            0 => self.pages.len() - 1,
            c => c - 1,
        };
    }

    pub fn first(&mut self) {
        self.cursor = 0;
    }

    pub fn last(&mut self) {
        self.cursor = self.pages.len() - 1;
    }
}

/// Handle to a sent paginated message
#[derive(Clone)]
pub struct Paginated {
    pub message: MessageId,
    pub channel: ChannelId,
    state: Arc<Mutex<PaginationState>>,
}

impl Paginated {
    pub async fn cursor(&self) -> usize {
        self.state.lock().await.cursor()
    }
}

/// Sends `pages` and attaches reaction handlers to flip through them.
///
/// The author can always delete the message with ❌. With more than one page
/// ⬅️ and ➡️ move with wraparound; `extended` adds ⏪ and ⏩ to jump to the
/// first and last page.
pub async fn paginate(ctx: &Arc<Context>, pages: Vec<Page>, extended: bool) -> Result<Paginated, PaginatorError> {
    if pages.is_empty() {
        return Err(PaginatorError::NoPages);
    }

    let pages: Vec<Page> = pages.iter().map(|p| ctx.coloured(p)).collect();
    let count = pages.len();
    let channel = ctx.message.channel_id;
    let mentions = ctx.services.default_mentions;
    let message = ctx.api().send_message(channel, "", Some(&pages[0]), mentions).await?;

    let paginated = Paginated {
        message,
        channel,
        state: Arc::new(Mutex::new(PaginationState::new(pages))),
    };
    let author = ctx.author.id;

    let delete = callback(move |ctx: Arc<Context>| async move {
        ctx.api().delete_message(channel, message).await?;
        Ok(())
    });
    ctx.subscribe(message, CANCEL, author, SubscriptionOptions::one_shot(), delete)
        .await;

    // a single page has nothing to flip through
    if count == 1 {
        return Ok(paginated);
    }

    let controls: &[&str] = if extended {
        &[CANCEL, FIRST, PREVIOUS, NEXT, LAST]
    } else {
        &[PREVIOUS, NEXT]
    };
    for emoji in controls {
        ctx.react(message, *emoji).await?;
    }

    let navigation = SubscriptionOptions::persistent().respond_to_removal();
    ctx.subscribe(message, PREVIOUS, author, navigation, turn(&paginated, PaginationState::previous))
        .await;
    ctx.subscribe(message, NEXT, author, navigation, turn(&paginated, PaginationState::next))
        .await;

    if extended {
        ctx.subscribe(message, FIRST, author, navigation, turn(&paginated, PaginationState::first))
            .await;
        ctx.subscribe(message, LAST, author, navigation, turn(&paginated, PaginationState::last))
            .await;
    }

    Ok(paginated)
}

// The state lock is held across the cursor update and the edit, so two
// navigation reactions never interleave on the same message.
fn turn(paginated: &Paginated, step: fn(&mut PaginationState)) -> ReactionCallback {
    let state = paginated.state.clone();
    let channel = paginated.channel;
    let message = paginated.message;

    callback(move |ctx: Arc<Context>| {
        let state = state.clone();
        async move {
            let mut state = state.lock().await;
            step(&mut *state);
            ctx.api()
                .edit_message(channel, message, None, Some(state.current()), ctx.services.default_mentions)
                .await?;
            Ok(())
        }
    })
}

/// Splits `fields` into pages of at most `per_page` fields, each footed with `Page i/N`
pub fn field_pages(title: &str, description: &str, colour: u32, fields: Vec<PageField>, per_page: usize) -> Vec<Page> {
    let per_page = per_page.max(1);
    let total = (fields.len() + per_page - 1) / per_page;

    fields
        .chunks(per_page)
        .enumerate()
        .map(|(i, chunk)| Page {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            colour: Some(colour),
            fields: chunk.to_vec(),
            footer: Some(format!("Page {}/{}", i + 1, total)),
        })
        .collect()
}
