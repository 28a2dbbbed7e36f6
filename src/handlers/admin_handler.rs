use log::{info, warn};
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};

use crate::bot::{BotContext, Command, TelegramBot};
use crate::handlers::{CallbackHandler, CommandHandler};
use crate::localization::Lang;
use crate::models::TicketAuthor;
use crate::utils::message_formatter::MODERATION_PREVIEW_CHARS;
use crate::utils::MessageFormatter;

pub struct AdminHandler;

impl AdminHandler {
    pub async fn handle_command(ctx: BotContext, msg: Message, cmd: Command) -> ResponseResult<()> {
        let Some(user) = msg.from.as_ref() else {
            return Ok(());
        };
        let admin_id = user.id.0 as i64;
        let lang = Lang::from_code(user.language_code.as_deref());
        let chat_id = msg.chat.id;

        if !ctx.economy.lock().await.is_admin(admin_id) {
            warn!("User {} tried admin command {:?}", admin_id, cmd);
            ctx.bot.send_message(chat_id, lang.error_admin_only()).await?;
            return Ok(());
        }
        info!("Admin {} issued {:?}", admin_id, cmd);

        match cmd {
            Command::Pending => Self::handle_pending(&ctx, chat_id, lang).await?,
            Command::Stats => {
                let stats = { ctx.economy.lock().await.stats() };
                ctx.bot
                    .send_message(
                        chat_id,
                        lang.stats(
                            stats.users,
                            stats.total_energy,
                            stats.pending_posts,
                            stats.approved_posts,
                            stats.published_posts,
                            stats.open_tickets,
                        ),
                    )
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
            Command::Pause | Command::Resume => {
                let paused = cmd == Command::Pause;
                ctx.economy.lock().await.set_autopost_paused(paused);
                ctx.bot
                    .send_message(chat_id, lang.autopost_state(paused))
                    .await?;
            }
            Command::SetPostPrice(args) => match args.trim().parse::<u32>() {
                Ok(cost) => {
                    ctx.economy.lock().await.update_post_price(cost);
                    ctx.bot.send_message(chat_id, lang.admin_done()).await?;
                }
                Err(_) => {
                    ctx.bot
                        .send_message(chat_id, lang.admin_usage("/set_post_price 20"))
                        .await?;
                }
            },
            Command::SetEnergyPrice(args) => {
                let result = match args.trim().replace(',', ".").parse::<f64>() {
                    Ok(price) => Some(ctx.economy.lock().await.update_energy_price(price)),
                    Err(_) => None,
                };
                let text = match result {
                    Some(Ok(())) => lang.admin_done().to_string(),
                    Some(Err(e)) => lang.economy_error(&e),
                    None => lang.admin_usage("/set_energy_price 4.99"),
                };
                ctx.bot.send_message(chat_id, text).await?;
            }
            Command::AddWord(word) | Command::RemoveWord(word) if word.trim().is_empty() => {
                ctx.bot
                    .send_message(chat_id, lang.admin_usage("/add_word word, /remove_word word"))
                    .await?;
            }
            Command::AddWord(word) => {
                let words = {
                    let mut economy = ctx.economy.lock().await;
                    economy.add_banned_word(&word);
                    economy.banned_words()
                };
                ctx.bot
                    .send_message(chat_id, lang.banned_words_list(&words))
                    .await?;
            }
            Command::RemoveWord(word) => {
                let words = {
                    let mut economy = ctx.economy.lock().await;
                    economy.remove_banned_word(&word);
                    economy.banned_words()
                };
                ctx.bot
                    .send_message(chat_id, lang.banned_words_list(&words))
                    .await?;
            }
            Command::Words => {
                let words = { ctx.economy.lock().await.banned_words() };
                ctx.bot
                    .send_message(chat_id, lang.banned_words_list(&words))
                    .await?;
            }
            Command::Grant(args) => Self::handle_grant(&ctx, chat_id, &args, lang).await?,
            Command::Reply(args) => Self::handle_reply(&ctx, chat_id, &args, lang).await?,
            Command::Close(args) => Self::handle_close(&ctx, chat_id, &args, lang).await?,
            _ => {
                info!("Command {:?} is not handled by the admin handler", cmd);
            }
        }
        Ok(())
    }

    async fn handle_pending(ctx: &BotContext, chat_id: ChatId, lang: Lang) -> ResponseResult<()> {
        let pending = { ctx.economy.lock().await.pending_posts() };
        if pending.is_empty() {
            ctx.bot.send_message(chat_id, lang.no_pending_posts()).await?;
            return Ok(());
        }

        for post in pending {
            let text = lang.moderation_request(
                post.post_id,
                post.user_id,
                post.requires_pin,
                &MessageFormatter::escape_html(&MessageFormatter::preview(
                    &post.text,
                    MODERATION_PREVIEW_CHARS,
                )),
            );
            ctx.bot
                .send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(CallbackHandler::create_moderation_keyboard(lang, post.post_id))
                .await?;
        }
        Ok(())
    }

    async fn handle_grant(
        ctx: &BotContext,
        chat_id: ChatId,
        args: &str,
        lang: Lang,
    ) -> ResponseResult<()> {
        let parsed = MessageFormatter::split_first_arg(args).and_then(|(user, amount)| {
            Some((user.parse::<i64>().ok()?, amount.parse::<u32>().ok()?))
        });
        let Some((user_id, amount)) = parsed else {
            ctx.bot
                .send_message(chat_id, lang.admin_usage("/grant user_id amount"))
                .await?;
            return Ok(());
        };

        let result = { ctx.economy.lock().await.grant_energy(user_id, amount) };
        match result {
            Ok(balance) => {
                ctx.bot.send_message(chat_id, lang.admin_done()).await?;
                let user_lang = CommandHandler::stored_lang(ctx, user_id).await;
                TelegramBot::notify(
                    &ctx.bot,
                    ChatId(user_id),
                    user_lang.invoice_paid_energy(amount, balance),
                )
                .await;
            }
            Err(e) => {
                ctx.bot.send_message(chat_id, lang.economy_error(&e)).await?;
            }
        }
        Ok(())
    }

    async fn handle_reply(
        ctx: &BotContext,
        chat_id: ChatId,
        args: &str,
        lang: Lang,
    ) -> ResponseResult<()> {
        let parsed = MessageFormatter::split_first_arg(args)
            .and_then(|(ticket, text)| Some((ticket.parse::<u64>().ok()?, text.to_string())))
            .filter(|(_, text)| !text.is_empty());
        let Some((ticket_id, text)) = parsed else {
            ctx.bot
                .send_message(chat_id, lang.admin_usage("/reply ticket_id text"))
                .await?;
            return Ok(());
        };

        let result = {
            ctx.economy
                .lock()
                .await
                .add_ticket_message(ticket_id, TicketAuthor::Admin, &text)
        };
        match result {
            Ok(ticket) => {
                ctx.bot.send_message(chat_id, lang.admin_done()).await?;
                let user_lang = CommandHandler::stored_lang(ctx, ticket.user_id).await;
                TelegramBot::notify(
                    &ctx.bot,
                    ChatId(ticket.user_id),
                    user_lang.ticket_reply(ticket_id, &MessageFormatter::escape_html(&text)),
                )
                .await;
            }
            Err(e) => {
                ctx.bot.send_message(chat_id, lang.economy_error(&e)).await?;
            }
        }
        Ok(())
    }

    async fn handle_close(
        ctx: &BotContext,
        chat_id: ChatId,
        args: &str,
        lang: Lang,
    ) -> ResponseResult<()> {
        let Ok(ticket_id) = args.trim().parse::<u64>() else {
            ctx.bot
                .send_message(chat_id, lang.admin_usage("/close ticket_id"))
                .await?;
            return Ok(());
        };

        let result = { ctx.economy.lock().await.close_ticket(ticket_id) };
        match result {
            Ok(ticket) => {
                ctx.bot
                    .send_message(chat_id, lang.ticket_closed(ticket_id))
                    .await?;
                let user_lang = CommandHandler::stored_lang(ctx, ticket.user_id).await;
                TelegramBot::notify(&ctx.bot, ChatId(ticket.user_id), user_lang.ticket_closed(ticket_id))
                    .await;
            }
            Err(e) => {
                ctx.bot.send_message(chat_id, lang.economy_error(&e)).await?;
            }
        }
        Ok(())
    }
}
