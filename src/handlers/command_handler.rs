use chrono::Utc;
use log::{error, info};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, ParseMode};

use crate::bot::{BotContext, Command, TelegramBot};
use crate::config::MAX_GOLDEN_CARD_HOURS;
use crate::economy::{ChannelEconomyService, EconomyError, ReferralReward};
use crate::handlers::CallbackHandler;
use crate::localization::Lang;
use crate::models::{InvoiceKind, TicketAuthor, TicketStatus};
use crate::user_session::SessionState;
use crate::utils::message_formatter::MODERATION_PREVIEW_CHARS;
use crate::utils::MessageFormatter;

#[derive(Debug)]
struct UserInfo<'a> {
    telegram_user_id: i64,
    username: Option<&'a str>,
    full_name: String,
    language_code: Option<&'a str>,
}

pub struct CommandHandler;

impl CommandHandler {
    pub async fn handle_command(ctx: BotContext, msg: Message, cmd: Command) -> ResponseResult<()> {
        let Some(user_info) = Self::extract_user_info_from_message(&msg) else {
            return Ok(());
        };
        let lang = Lang::from_code(user_info.language_code);
        let user_id = user_info.telegram_user_id;

        match cmd {
            Command::Start(payload) => {
                Self::handle_start_command(&ctx, &msg, &user_info, &payload, lang).await?;
            }
            Command::Help => {
                let (post_cost, referral_bonus) = {
                    let economy = ctx.economy.lock().await;
                    (economy.settings().post_energy_cost, economy.economy().referral_energy)
                };
                ctx.bot
                    .send_message(msg.chat.id, lang.help(post_cost, referral_bonus))
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
            Command::Balance => {
                Self::send_balance(&ctx, msg.chat.id, user_id, lang).await?;
            }
            Command::BuyEnergy(args) => match args.trim().parse::<u32>() {
                Ok(amount) if amount > 0 => {
                    ctx.payment_handler
                        .send_invoice(&ctx.bot, msg.chat.id, user_id, InvoiceKind::Energy { amount }, lang)
                        .await?;
                }
                _ => {
                    ctx.bot
                        .send_message(msg.chat.id, lang.energy_usage())
                        .reply_markup(CallbackHandler::create_energy_keyboard(lang))
                        .await?;
                }
            },
            Command::BuyGoldenCard(args) => match args.trim().parse::<u32>() {
                Ok(hours) if (1..=MAX_GOLDEN_CARD_HOURS).contains(&hours) => {
                    ctx.payment_handler
                        .send_invoice(&ctx.bot, msg.chat.id, user_id, InvoiceKind::GoldenCard { hours }, lang)
                        .await?;
                }
                _ => {
                    ctx.bot
                        .send_message(msg.chat.id, lang.golden_usage("buy_golden_card"))
                        .reply_markup(CallbackHandler::create_golden_keyboard(lang))
                        .await?;
                }
            },
            Command::GoldenForEnergy(args) => {
                Self::handle_golden_for_energy(&ctx, msg.chat.id, user_id, &args, lang).await?;
            }
            Command::Post(text) => {
                if !Self::ensure_registered(&ctx, msg.chat.id, user_id, lang).await? {
                    return Ok(());
                }
                if text.trim().is_empty() {
                    let cost = { ctx.economy.lock().await.settings().post_energy_cost };
                    ctx.sessions.set_session(user_id, SessionState::AwaitingPost).await;
                    ctx.bot
                        .send_message(msg.chat.id, lang.post_prompt(cost))
                        .reply_markup(CallbackHandler::create_cancel_keyboard(lang))
                        .await?;
                } else {
                    Self::submit_post(&ctx, msg.chat.id, user_id, &text, lang).await?;
                }
            }
            Command::Referral => {
                Self::handle_referral_command(&ctx, msg.chat.id, user_id, lang).await?;
            }
            Command::Support(text) => {
                Self::handle_support_command(&ctx, msg.chat.id, user_id, &text, lang).await?;
            }
            Command::Tickets => {
                let tickets = { ctx.economy.lock().await.list_user_tickets(user_id) };
                let text = if tickets.is_empty() {
                    lang.no_tickets().to_string()
                } else {
                    tickets
                        .iter()
                        .map(|ticket| {
                            lang.ticket_line(
                                ticket.ticket_id,
                                ticket.status == TicketStatus::Open,
                                ticket.messages.len(),
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                ctx.bot.send_message(msg.chat.id, text).await?;
            }
            _ => {
                info!("Command {:?} is not handled by the user handler", cmd);
            }
        }
        Ok(())
    }

    fn extract_user_info_from_message(msg: &Message) -> Option<UserInfo<'_>> {
        let user = msg.from.as_ref()?;
        Some(UserInfo {
            telegram_user_id: user.id.0 as i64,
            username: user.username.as_deref(),
            full_name: user.full_name(),
            language_code: user.language_code.as_deref(),
        })
    }

    async fn handle_start_command(
        ctx: &BotContext,
        msg: &Message,
        user_info: &UserInfo<'_>,
        payload: &str,
        lang: Lang,
    ) -> ResponseResult<()> {
        let user_id = user_info.telegram_user_id;
        let subscribed = TelegramBot::is_subscribed_to_sponsors(ctx, user_id).await;

        let outcome = {
            let mut economy = ctx.economy.lock().await;
            match economy.register_user(
                user_id,
                subscribed,
                user_info.username,
                Some(user_info.full_name.as_str()),
            ) {
                Ok((user, is_new)) => {
                    economy.set_language_code(user_id, user_info.language_code);
                    let reward = if is_new {
                        Self::apply_referral(&mut economy, payload, user_id)
                    } else {
                        None
                    };
                    Ok((user, is_new, reward))
                }
                Err(e) => Err(e),
            }
        };

        let (user, is_new, reward) = match outcome {
            Ok(outcome) => outcome,
            Err(EconomyError::NotSubscribed(_)) => {
                info!("User {} is not subscribed to sponsor channels", user_id);
                ctx.bot
                    .send_message(msg.chat.id, lang.error_not_subscribed())
                    .await?;
                return Ok(());
            }
            Err(e) => {
                error!("Failed to register user {}: {}", user_id, e);
                ctx.bot
                    .send_message(msg.chat.id, lang.error_account_access())
                    .await?;
                return Ok(());
            }
        };

        if let Some(reward) = reward {
            Self::send_referral_notification(ctx, &reward).await;
        }

        let welcome = if is_new {
            lang.welcome_registered(user.energy)
        } else {
            lang.welcome_back(user.energy)
        };
        ctx.bot
            .send_message(msg.chat.id, welcome)
            .parse_mode(ParseMode::Html)
            .reply_markup(CallbackHandler::create_main_menu_keyboard(lang))
            .await?;
        Ok(())
    }

    /// credits the referrer named in the start payload when it is a registered user
    fn apply_referral(
        economy: &mut ChannelEconomyService,
        payload: &str,
        user_id: i64,
    ) -> Option<ReferralReward> {
        let referrer_id = MessageFormatter::parse_start_payload(payload)?;
        if referrer_id == user_id {
            info!("User {} tried to refer themselves", user_id);
            return None;
        }
        if !economy.validate_referrer(referrer_id) {
            info!("Referrer user ID {} does not exist", referrer_id);
            return None;
        }
        match economy.award_referral(referrer_id, user_id) {
            Ok(reward) => reward,
            Err(e) => {
                error!("Failed to award referral {} -> {}: {}", referrer_id, user_id, e);
                None
            }
        }
    }

    async fn send_referral_notification(ctx: &BotContext, reward: &ReferralReward) {
        let lang = Self::stored_lang(ctx, reward.referrer_id).await;
        let text = lang.referral_reward(
            reward.energy_awarded,
            reward.referral_count,
            reward.is_celebration_milestone,
        );
        TelegramBot::notify(&ctx.bot, ChatId(reward.referrer_id), text).await;
    }

    /// language stored for a user, english when unknown
    pub async fn stored_lang(ctx: &BotContext, user_id: i64) -> Lang {
        let economy = ctx.economy.lock().await;
        let code = economy
            .get_user_balance(user_id)
            .and_then(|user| user.language_code);
        Lang::from_code(code.as_deref())
    }

    /// replies with the registration hint and returns false for unregistered users
    pub async fn ensure_registered(
        ctx: &BotContext,
        chat_id: ChatId,
        user_id: i64,
        lang: Lang,
    ) -> ResponseResult<bool> {
        let registered = {
            ctx.economy
                .lock()
                .await
                .get_user_balance(user_id)
                .map(|user| user.is_registered())
                .unwrap_or(false)
        };
        if !registered {
            ctx.bot
                .send_message(chat_id, lang.error_user_not_found())
                .await?;
        }
        Ok(registered)
    }

    pub async fn send_balance(
        ctx: &BotContext,
        chat_id: ChatId,
        user_id: i64,
        lang: Lang,
    ) -> ResponseResult<()> {
        let balance = {
            let economy = ctx.economy.lock().await;
            economy.get_user_balance(user_id).map(|user| {
                (
                    user.energy,
                    user.active_golden_cards(Utc::now()),
                    economy.settings().post_energy_cost,
                )
            })
        };

        match balance {
            Some((energy, cards, post_cost)) => {
                ctx.bot
                    .send_message(chat_id, lang.balance(energy, cards, post_cost))
                    .parse_mode(ParseMode::Html)
                    .reply_markup(CallbackHandler::create_main_menu_keyboard(lang))
                    .await?;
            }
            None => {
                ctx.bot
                    .send_message(chat_id, lang.error_user_not_found())
                    .await?;
            }
        }
        Ok(())
    }

    async fn handle_golden_for_energy(
        ctx: &BotContext,
        chat_id: ChatId,
        user_id: i64,
        args: &str,
        lang: Lang,
    ) -> ResponseResult<()> {
        let hours = match args.trim().parse::<u32>() {
            Ok(hours) if (1..=MAX_GOLDEN_CARD_HOURS).contains(&hours) => hours,
            _ => {
                ctx.bot
                    .send_message(chat_id, lang.golden_usage("golden_for_energy"))
                    .await?;
                return Ok(());
            }
        };
        if !Self::ensure_registered(ctx, chat_id, user_id, lang).await? {
            return Ok(());
        }

        let duration = chrono::Duration::hours(hours as i64);
        let result = {
            let mut economy = ctx.economy.lock().await;
            economy
                .purchase_golden_card_with_energy(user_id, duration)
                .map(|spent| {
                    let balance = economy
                        .get_user_balance(user_id)
                        .map(|user| user.energy)
                        .unwrap_or(0);
                    (spent, balance)
                })
        };

        let text = match result {
            Ok((spent, balance)) => lang.golden_bought_with_energy(duration.num_hours(), spent, balance),
            Err(e) => lang.economy_error(&e),
        };
        ctx.bot.send_message(chat_id, text).await?;
        Ok(())
    }

    /// charges and queues a post; returns true when it was accepted
    pub async fn submit_post(
        ctx: &BotContext,
        chat_id: ChatId,
        user_id: i64,
        text: &str,
        lang: Lang,
    ) -> ResponseResult<bool> {
        let result = {
            let mut economy = ctx.economy.lock().await;
            economy.submit_post(user_id, text).and_then(|post| {
                // nobody to moderate: straight to the publishing queue
                if economy.admin_ids().is_empty() {
                    economy.approve_post(post.post_id)
                } else {
                    Ok(post)
                }
            })
        };

        let post = match result {
            Ok(post) => post,
            Err(e) => {
                info!("Post from user {} refused: {}", user_id, e);
                ctx.bot
                    .send_message(chat_id, lang.economy_error(&e))
                    .await?;
                return Ok(false);
            }
        };

        ctx.bot
            .send_message(chat_id, lang.post_accepted(post.post_id, post.requires_pin))
            .await?;

        let escaped = MessageFormatter::escape_html(&MessageFormatter::preview(
            &post.text,
            MODERATION_PREVIEW_CHARS,
        ));
        let post_id = post.post_id;
        let author = post.user_id;
        let pinned = post.requires_pin;
        Self::notify_admins(
            ctx,
            |admin_lang| admin_lang.moderation_request(post_id, author, pinned, &escaped),
            |admin_lang| Some(CallbackHandler::create_moderation_keyboard(admin_lang, post_id)),
        )
        .await;
        Ok(true)
    }

    /// sends a localized message to every administrator
    pub async fn notify_admins<T, K>(ctx: &BotContext, text: T, keyboard: K)
    where
        T: Fn(Lang) -> String,
        K: Fn(Lang) -> Option<InlineKeyboardMarkup>,
    {
        let admins = {
            let economy = ctx.economy.lock().await;
            economy
                .admin_ids()
                .into_iter()
                .map(|admin_id| {
                    let code = economy
                        .get_user_balance(admin_id)
                        .and_then(|user| user.language_code);
                    (admin_id, Lang::from_code(code.as_deref()))
                })
                .collect::<Vec<_>>()
        };

        for (admin_id, admin_lang) in admins {
            let mut request = ctx
                .bot
                .send_message(ChatId(admin_id), text(admin_lang))
                .parse_mode(ParseMode::Html);
            if let Some(markup) = keyboard(admin_lang) {
                request = request.reply_markup(markup);
            }
            if let Err(e) = request.await {
                error!("Failed to notify admin {}: {}", admin_id, e);
            }
        }
    }

    async fn handle_referral_command(
        ctx: &BotContext,
        chat_id: ChatId,
        user_id: i64,
        lang: Lang,
    ) -> ResponseResult<()> {
        if !Self::ensure_registered(ctx, chat_id, user_id, lang).await? {
            return Ok(());
        }
        let (bonus, count) = {
            let economy = ctx.economy.lock().await;
            let count = economy
                .get_user_balance(user_id)
                .map(|user| user.referred_users.len())
                .unwrap_or(0);
            (economy.economy().referral_energy, count)
        };
        let link = MessageFormatter::referral_link(&ctx.channel.bot_username, user_id);
        ctx.bot
            .send_message(chat_id, lang.referral_link(&link, bonus, count))
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }

    async fn handle_support_command(
        ctx: &BotContext,
        chat_id: ChatId,
        user_id: i64,
        text: &str,
        lang: Lang,
    ) -> ResponseResult<()> {
        if text.trim().is_empty() {
            let open_ticket = {
                ctx.economy
                    .lock()
                    .await
                    .list_user_tickets(user_id)
                    .into_iter()
                    .rev()
                    .find(|ticket| ticket.status == TicketStatus::Open)
            };
            match open_ticket {
                Some(ticket) => {
                    ctx.sessions
                        .set_session(
                            user_id,
                            SessionState::AwaitingTicketMessage {
                                ticket_id: ticket.ticket_id,
                            },
                        )
                        .await;
                    ctx.bot
                        .send_message(chat_id, lang.ticket_follow_up_prompt(ticket.ticket_id))
                        .reply_markup(CallbackHandler::create_cancel_keyboard(lang))
                        .await?;
                }
                None => {
                    ctx.bot.send_message(chat_id, lang.support_usage()).await?;
                }
            }
            return Ok(());
        }

        let result = { ctx.economy.lock().await.open_ticket(user_id, text) };
        match result {
            Ok(ticket) => {
                ctx.bot
                    .send_message(chat_id, lang.ticket_opened(ticket.ticket_id))
                    .await?;
                let escaped = MessageFormatter::escape_html(text.trim());
                Self::notify_admins(
                    ctx,
                    |admin_lang| admin_lang.ticket_admin_notice(ticket.ticket_id, user_id, &escaped),
                    |_| None,
                )
                .await;
            }
            Err(e) => {
                ctx.bot.send_message(chat_id, lang.economy_error(&e)).await?;
            }
        }
        Ok(())
    }

    /// appends a user message to one of their own open tickets
    pub async fn append_ticket_message(
        ctx: &BotContext,
        chat_id: ChatId,
        user_id: i64,
        ticket_id: u64,
        text: &str,
        lang: Lang,
    ) -> ResponseResult<()> {
        let result = {
            let mut economy = ctx.economy.lock().await;
            match economy.get_ticket(ticket_id) {
                Some(ticket) if ticket.user_id == user_id => {
                    economy.add_ticket_message(ticket_id, TicketAuthor::User, text)
                }
                _ => Err(EconomyError::TicketNotFound(ticket_id)),
            }
        };

        match result {
            Ok(_) => {
                ctx.bot
                    .send_message(chat_id, lang.ticket_message_added(ticket_id))
                    .await?;
                let escaped = MessageFormatter::escape_html(text.trim());
                Self::notify_admins(
                    ctx,
                    |admin_lang| admin_lang.ticket_admin_notice(ticket_id, user_id, &escaped),
                    |_| None,
                )
                .await;
            }
            Err(e) => {
                ctx.bot.send_message(chat_id, lang.economy_error(&e)).await?;
            }
        }
        Ok(())
    }
}
