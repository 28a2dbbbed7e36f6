use log::{error, info};
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MaybeInaccessibleMessage,
    MessageId,
};

use crate::bot::{BotContext, TelegramBot};
use crate::handlers::CommandHandler;
use crate::localization::Lang;
use crate::models::InvoiceKind;
use crate::user_session::SessionState;

pub const ENERGY_BUNDLES: [u32; 3] = [50, 100, 300];
pub const GOLDEN_CARD_HOURS: [u32; 3] = [12, 24, 72];

/// parsed inline button payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Menu,
    Balance,
    EnergyMenu,
    GoldenMenu,
    Post,
    BuyEnergy(u32),
    BuyGolden(u32),
    Approve(u64),
    Reject(u64),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(':');
        let action = match (parts.next()?, parts.next()?) {
            ("action", "menu") => CallbackAction::Menu,
            ("action", "balance") => CallbackAction::Balance,
            ("action", "energy") => CallbackAction::EnergyMenu,
            ("action", "golden_card") => CallbackAction::GoldenMenu,
            ("action", "post") => CallbackAction::Post,
            ("energy", amount) => CallbackAction::BuyEnergy(amount.parse().ok()?),
            ("golden", hours) => CallbackAction::BuyGolden(hours.parse().ok()?),
            ("moderate", "approve") => CallbackAction::Approve(parts.next()?.parse().ok()?),
            ("moderate", "reject") => CallbackAction::Reject(parts.next()?.parse().ok()?),
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(action)
    }
}

pub struct CallbackHandler;

impl CallbackHandler {
    fn get_chat_id(message: &MaybeInaccessibleMessage) -> ChatId {
        match message {
            MaybeInaccessibleMessage::Regular(msg) => msg.chat.id,
            MaybeInaccessibleMessage::Inaccessible(msg) => msg.chat.id,
        }
    }

    fn get_message_id(message: &MaybeInaccessibleMessage) -> MessageId {
        match message {
            MaybeInaccessibleMessage::Regular(msg) => msg.id,
            MaybeInaccessibleMessage::Inaccessible(msg) => msg.message_id,
        }
    }

    pub fn create_main_menu_keyboard(lang: Lang) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(vec![
            vec![InlineKeyboardButton::callback(lang.btn_balance(), "action:balance")],
            vec![InlineKeyboardButton::callback(lang.btn_energy(), "action:energy")],
            vec![InlineKeyboardButton::callback(
                lang.btn_golden_card(),
                "action:golden_card",
            )],
            vec![InlineKeyboardButton::callback(lang.btn_post(), "action:post")],
        ])
    }

    pub fn create_energy_keyboard(lang: Lang) -> InlineKeyboardMarkup {
        let bundles = ENERGY_BUNDLES
            .iter()
            .map(|amount| {
                InlineKeyboardButton::callback(format!("{} ⚡️", amount), format!("energy:{}", amount))
            })
            .collect::<Vec<_>>();
        InlineKeyboardMarkup::new(vec![
            bundles,
            vec![InlineKeyboardButton::callback(lang.btn_menu(), "action:menu")],
        ])
    }

    pub fn create_golden_keyboard(lang: Lang) -> InlineKeyboardMarkup {
        let durations = GOLDEN_CARD_HOURS
            .iter()
            .map(|hours| InlineKeyboardButton::callback(lang.btn_hours(*hours), format!("golden:{}", hours)))
            .collect::<Vec<_>>();
        InlineKeyboardMarkup::new(vec![
            durations,
            vec![InlineKeyboardButton::callback(lang.btn_menu(), "action:menu")],
        ])
    }

    pub fn create_cancel_keyboard(lang: Lang) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
            lang.btn_cancel(),
            "action:menu",
        )]])
    }

    pub fn create_moderation_keyboard(lang: Lang, post_id: u64) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback(lang.btn_approve(), format!("moderate:approve:{}", post_id)),
            InlineKeyboardButton::callback(lang.btn_reject(), format!("moderate:reject:{}", post_id)),
        ]])
    }

    pub async fn handle_callback_query(ctx: BotContext, query: CallbackQuery) -> ResponseResult<()> {
        let lang = Lang::from_code(query.from.language_code.as_deref());
        let (Some(data), Some(message)) = (&query.data, &query.message) else {
            ctx.bot.answer_callback_query(&query.id).await?;
            return Ok(());
        };

        let Some(action) = CallbackAction::parse(data) else {
            info!("Unknown callback data: {}", data);
            ctx.bot
                .answer_callback_query(&query.id)
                .text(lang.error_invalid_choice())
                .await?;
            return Ok(());
        };

        let chat_id = Self::get_chat_id(message);
        let user_id = query.from.id.0 as i64;

        match action {
            CallbackAction::Menu => {
                ctx.sessions.clear_session(user_id).await;
                ctx.bot.answer_callback_query(&query.id).await?;
                ctx.bot
                    .send_message(chat_id, lang.main_menu_prompt())
                    .reply_markup(Self::create_main_menu_keyboard(lang))
                    .await?;
            }
            CallbackAction::Balance => {
                ctx.bot.answer_callback_query(&query.id).await?;
                CommandHandler::send_balance(&ctx, chat_id, user_id, lang).await?;
            }
            CallbackAction::EnergyMenu => {
                ctx.bot.answer_callback_query(&query.id).await?;
                ctx.bot
                    .send_message(chat_id, lang.choose_energy_bundle())
                    .reply_markup(Self::create_energy_keyboard(lang))
                    .await?;
            }
            CallbackAction::GoldenMenu => {
                ctx.bot.answer_callback_query(&query.id).await?;
                ctx.bot
                    .send_message(chat_id, lang.choose_golden_duration())
                    .reply_markup(Self::create_golden_keyboard(lang))
                    .await?;
            }
            CallbackAction::Post => {
                ctx.bot.answer_callback_query(&query.id).await?;
                if !CommandHandler::ensure_registered(&ctx, chat_id, user_id, lang).await? {
                    return Ok(());
                }
                let cost = { ctx.economy.lock().await.settings().post_energy_cost };
                ctx.sessions.set_session(user_id, SessionState::AwaitingPost).await;
                ctx.bot
                    .send_message(chat_id, lang.post_prompt(cost))
                    .reply_markup(Self::create_cancel_keyboard(lang))
                    .await?;
            }
            CallbackAction::BuyEnergy(amount) => {
                ctx.bot.answer_callback_query(&query.id).await?;
                ctx.payment_handler
                    .send_invoice(&ctx.bot, chat_id, user_id, InvoiceKind::Energy { amount }, lang)
                    .await?;
            }
            CallbackAction::BuyGolden(hours) => {
                ctx.bot.answer_callback_query(&query.id).await?;
                ctx.payment_handler
                    .send_invoice(&ctx.bot, chat_id, user_id, InvoiceKind::GoldenCard { hours }, lang)
                    .await?;
            }
            CallbackAction::Approve(post_id) => {
                Self::handle_moderation(&ctx, &query, message, user_id, post_id, true, lang).await?;
            }
            CallbackAction::Reject(post_id) => {
                Self::handle_moderation(&ctx, &query, message, user_id, post_id, false, lang).await?;
            }
        }

        Ok(())
    }

    async fn handle_moderation(
        ctx: &BotContext,
        query: &CallbackQuery,
        message: &MaybeInaccessibleMessage,
        admin_id: i64,
        post_id: u64,
        approve: bool,
        lang: Lang,
    ) -> ResponseResult<()> {
        let result = {
            let mut economy = ctx.economy.lock().await;
            if !economy.is_admin(admin_id) {
                drop(economy);
                ctx.bot
                    .answer_callback_query(&query.id)
                    .text(lang.error_admin_only())
                    .await?;
                return Ok(());
            }
            if approve {
                economy.approve_post(post_id)
            } else {
                economy.reject_post(post_id)
            }
        };

        let post = match result {
            Ok(post) => post,
            Err(e) => {
                info!("Moderation of post {} by {} skipped: {}", post_id, admin_id, e);
                ctx.bot
                    .answer_callback_query(&query.id)
                    .text(lang.moderation_already_done(post_id))
                    .await?;
                return Ok(());
            }
        };

        ctx.bot
            .answer_callback_query(&query.id)
            .text(lang.moderation_done(post_id, approve))
            .await?;

        if let Err(e) = ctx
            .bot
            .edit_message_reply_markup(Self::get_chat_id(message), Self::get_message_id(message))
            .await
        {
            error!("Failed to clear moderation keyboard for post {}: {}", post_id, e);
        }

        let author_lang = CommandHandler::stored_lang(ctx, post.user_id).await;
        let notice = if approve {
            author_lang.post_approved_notice(post_id)
        } else {
            author_lang.post_rejected_notice(post_id, post.energy_spent)
        };
        TelegramBot::notify(&ctx.bot, ChatId(post.user_id), notice).await;
        info!(
            "Admin {} {} post {}",
            admin_id,
            if approve { "approved" } else { "rejected" },
            post_id
        );
        Ok(())
    }
}
