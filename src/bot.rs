use chrono::Utc;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, ParseMode, UserId};
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::economy::ChannelEconomyService;
use crate::handlers::{AdminHandler, CallbackHandler, CommandHandler, PaymentHandler};
use crate::localization::Lang;
use crate::payments::CryptoPayClient;
use crate::storage::InMemoryStorage;
use crate::user_session::{SessionManager, SessionState};

pub type SharedEconomy = Arc<Mutex<ChannelEconomyService>>;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case", description = "Supported commands:")]
pub enum Command {
    #[command(description = "register and open the menu")]
    Start(String),
    #[command(description = "how the bot works")]
    Help,
    #[command(description = "show your energy and golden cards")]
    Balance,
    #[command(description = "buy energy: /buy_energy 50")]
    BuyEnergy(String),
    #[command(description = "buy a golden card: /buy_golden_card 24")]
    BuyGoldenCard(String),
    #[command(description = "exchange energy for a golden card: /golden_for_energy 24")]
    GoldenForEnergy(String),
    #[command(description = "submit a post: /post text")]
    Post(String),
    #[command(description = "your referral link")]
    Referral,
    #[command(description = "contact support: /support text")]
    Support(String),
    #[command(description = "your support tickets")]
    Tickets,
    #[command(description = "admin: posts awaiting moderation")]
    Pending,
    #[command(description = "admin: ledger statistics")]
    Stats,
    #[command(description = "admin: pause autopost")]
    Pause,
    #[command(description = "admin: resume autopost")]
    Resume,
    #[command(description = "admin: set post price in energy")]
    SetPostPrice(String),
    #[command(description = "admin: set energy unit price")]
    SetEnergyPrice(String),
    #[command(description = "admin: add a banned word")]
    AddWord(String),
    #[command(description = "admin: remove a banned word")]
    RemoveWord(String),
    #[command(description = "admin: list banned words")]
    Words,
    #[command(description = "admin: grant energy: /grant user_id amount")]
    Grant(String),
    #[command(description = "admin: reply to a ticket: /reply ticket_id text")]
    Reply(String),
    #[command(description = "admin: close a ticket: /close ticket_id")]
    Close(String),
}

impl Command {
    pub fn is_admin_command(&self) -> bool {
        matches!(
            self,
            Command::Pending
                | Command::Stats
                | Command::Pause
                | Command::Resume
                | Command::SetPostPrice(_)
                | Command::SetEnergyPrice(_)
                | Command::AddWord(_)
                | Command::RemoveWord(_)
                | Command::Words
                | Command::Grant(_)
                | Command::Reply(_)
                | Command::Close(_)
        )
    }
}

/// deployment details the handlers need besides the ledger
#[derive(Debug, Clone)]
pub struct ChannelSettings {
    pub channel_id: Option<ChatId>,
    pub sponsor_channels: Vec<ChatId>,
    pub bot_username: String,
}

#[derive(Clone)]
pub struct BotContext {
    pub bot: Arc<Bot>,
    pub economy: SharedEconomy,
    pub sessions: SessionManager,
    pub payment_handler: PaymentHandler,
    pub channel: Arc<ChannelSettings>,
}

pub struct TelegramBot {
    bot: Arc<Bot>,
    economy: SharedEconomy,
    payment_handler: PaymentHandler,
    channel: Arc<ChannelSettings>,
    payment_poll_interval: Duration,
    publish_interval: Duration,
}

impl TelegramBot {
    pub async fn new(
        config: AppConfig,
        payment_poll_interval: Duration,
        publish_interval: Duration,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let bot = Arc::new(Bot::new(&config.bot_token));
        let me = bot.get_me().await?;
        info!("Authorized as @{}", me.username());

        let mut service = ChannelEconomyService::new(
            Box::new(InMemoryStorage::new()),
            config.pricing.clone(),
            config.filter.clone(),
            config.economy,
        );
        for admin_id in &config.admin_ids {
            service.set_admin(*admin_id, true);
        }
        info!("Configured {} administrator(s)", config.admin_ids.len());
        let economy = Arc::new(Mutex::new(service));

        let client = match &config.crypto_pay {
            Some(crypto) => Some(CryptoPayClient::from_config(crypto)?),
            None => None,
        };
        let payment_handler = PaymentHandler::new(economy.clone(), client);

        let channel = Arc::new(ChannelSettings {
            channel_id: config.channel_id.map(ChatId),
            sponsor_channels: config.sponsor_channels.iter().copied().map(ChatId).collect(),
            bot_username: me.username().to_string(),
        });
        if channel.channel_id.is_none() {
            warn!("CHANNEL_ID is not configured; approved posts will not be published");
        }

        Ok(Self {
            bot,
            economy,
            payment_handler,
            channel,
            payment_poll_interval,
            publish_interval,
        })
    }

    /// sends approved posts to the channel one at a time, pinning golden-card posts
    async fn run_channel_publisher(
        bot: Arc<Bot>,
        economy: SharedEconomy,
        channel_id: ChatId,
        period: Duration,
    ) {
        info!("Starting channel publisher");
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;

            let post = { economy.lock().await.next_post_to_publish() };
            let Some(post) = post else {
                continue;
            };

            let sent = match bot.send_message(channel_id, &post.text).await {
                Ok(sent) => sent,
                Err(e) => {
                    error!("Failed to publish post {}: {}", post.post_id, e);
                    continue;
                }
            };

            if post.requires_pin {
                if let Err(e) = bot.pin_chat_message(channel_id, sent.id).await {
                    error!("Failed to pin post {}: {}", post.post_id, e);
                }
            }

            let published = { economy.lock().await.mark_post_published(post.post_id, Utc::now()) };
            match published {
                Ok(post) => info!(
                    "Published post {} from user {} (pinned: {})",
                    post.post_id, post.user_id, post.requires_pin
                ),
                Err(e) => error!("Failed to mark post {} as published: {}", post.post_id, e),
            }
        }
    }

    async fn run_session_cleanup(sessions: SessionManager) {
        let mut interval = tokio::time::interval(Duration::from_secs(600));
        loop {
            interval.tick().await;
            let removed = sessions.cleanup_old_sessions(chrono::Duration::hours(1)).await;
            if removed > 0 {
                info!("Dropped {} stale sessions", removed);
            }
        }
    }

    pub async fn run(&self) {
        info!("Starting Telegram bot...");

        let sessions = SessionManager::new();

        if self.payment_handler.is_enabled() {
            let payment_handler = self.payment_handler.clone();
            let bot = self.bot.clone();
            let period = self.payment_poll_interval;
            tokio::spawn(async move {
                payment_handler.run_invoice_poller(bot, period).await;
            });
        }

        if let Some(channel_id) = self.channel.channel_id {
            let bot = self.bot.clone();
            let economy = self.economy.clone();
            let period = self.publish_interval;
            tokio::spawn(async move {
                Self::run_channel_publisher(bot, economy, channel_id, period).await;
            });
        }

        let sessions_clone = sessions.clone();
        tokio::spawn(async move {
            Self::run_session_cleanup(sessions_clone).await;
        });

        let ctx = BotContext {
            bot: self.bot.clone(),
            economy: self.economy.clone(),
            sessions,
            payment_handler: self.payment_handler.clone(),
            channel: self.channel.clone(),
        };

        let handler = dptree::entry()
            .branch(Update::filter_callback_query().endpoint({
                let ctx = ctx.clone();
                move |query: CallbackQuery| {
                    let ctx = ctx.clone();
                    async move { CallbackHandler::handle_callback_query(ctx, query).await }
                }
            }))
            .branch(
                Update::filter_message()
                    .branch(dptree::entry().filter_command::<Command>().endpoint({
                        let ctx = ctx.clone();
                        move |msg: Message, cmd: Command| {
                            let ctx = ctx.clone();
                            async move {
                                if cmd.is_admin_command() {
                                    AdminHandler::handle_command(ctx, msg, cmd).await
                                } else {
                                    CommandHandler::handle_command(ctx, msg, cmd).await
                                }
                            }
                        }
                    }))
                    .branch(dptree::endpoint({
                        let ctx = ctx.clone();
                        move |msg: Message| {
                            let ctx = ctx.clone();
                            async move { Self::handle_message(ctx, msg).await }
                        }
                    })),
            );

        Dispatcher::builder(self.bot.clone(), handler)
            .error_handler(
                teloxide::error_handlers::LoggingErrorHandler::with_custom_text(
                    "An error from the update listener",
                ),
            )
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    /// plain text: either the awaited post / ticket message, or a hint to use the menu
    async fn handle_message(ctx: BotContext, msg: Message) -> ResponseResult<()> {
        let Some(user) = msg.from.as_ref() else {
            return Ok(());
        };
        let user_id = user.id.0 as i64;
        let lang = Lang::from_code(user.language_code.as_deref());

        let Some(text) = msg.text() else {
            return Ok(());
        };

        match ctx.sessions.get_session(user_id).await {
            SessionState::AwaitingPost => {
                let text = text.trim();
                if text.is_empty() {
                    ctx.bot
                        .send_message(msg.chat.id, lang.error_empty_post())
                        .await?;
                    return Ok(());
                }
                if CommandHandler::submit_post(&ctx, msg.chat.id, user_id, text, lang).await? {
                    ctx.sessions.clear_session(user_id).await;
                    ctx.bot
                        .send_message(msg.chat.id, lang.main_menu_prompt())
                        .reply_markup(CallbackHandler::create_main_menu_keyboard(lang))
                        .await?;
                }
            }
            SessionState::AwaitingTicketMessage { ticket_id } => {
                CommandHandler::append_ticket_message(&ctx, msg.chat.id, user_id, ticket_id, text, lang)
                    .await?;
                ctx.sessions.clear_session(user_id).await;
            }
            SessionState::Idle => {
                ctx.bot
                    .send_message(msg.chat.id, lang.use_menu_hint())
                    .reply_markup(CallbackHandler::create_main_menu_keyboard(lang))
                    .await?;
            }
        }
        Ok(())
    }

    /// true when the user is present in every sponsor channel
    pub async fn is_subscribed_to_sponsors(ctx: &BotContext, user_id: i64) -> bool {
        for sponsor in &ctx.channel.sponsor_channels {
            match ctx.bot.get_chat_member(*sponsor, UserId(user_id as u64)).await {
                Ok(member) if member.is_present() => {}
                Ok(_) => return false,
                Err(e) => {
                    warn!(
                        "Failed to check subscription of user {} to {}: {}",
                        user_id, sponsor, e
                    );
                    return false;
                }
            }
        }
        true
    }

    /// sends an HTML message and logs instead of failing when the recipient is unreachable
    pub async fn notify(bot: &Bot, chat_id: ChatId, text: String) {
        if let Err(e) = bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .await
        {
            warn!("Failed to notify chat {}: {}", chat_id, e);
        }
    }
}
