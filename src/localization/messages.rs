use crate::config::MAX_GOLDEN_CARD_HOURS;
use crate::economy::EconomyError;

/// supported languages for the bot UI
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    En,
    Ru,
}

impl Lang {
    /// creates Lang from Telegram's language_code (e.g., "ru", "en", "uk")
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(code) if code.starts_with("ru") => Lang::Ru,
            _ => Lang::En,
        }
    }
}

// =============================================================================
// Error messages
// =============================================================================

impl Lang {
    pub fn error_account_access(&self) -> &'static str {
        match self {
            Lang::En => "❌ Sorry, there was an error accessing your account. Please try again later.",
            Lang::Ru => "❌ Извините, произошла ошибка при доступе к вашему аккаунту. Попробуйте позже.",
        }
    }

    pub fn error_user_not_found(&self) -> &'static str {
        match self {
            Lang::En => "❗️ User not found. Press /start to register.",
            Lang::Ru => "❗️ Пользователь не найден. Нажмите /start для регистрации.",
        }
    }

    pub fn error_not_subscribed(&self) -> &'static str {
        match self {
            Lang::En => "📢 Please subscribe to our sponsor channels first, then press /start again.",
            Lang::Ru => "📢 Сначала подпишитесь на каналы спонсоров, затем снова нажмите /start.",
        }
    }

    pub fn error_insufficient_energy(&self, required: u32, available: u32) -> String {
        match self {
            Lang::En => format!(
                "⚡️ Not enough energy: {} required, you have {}.\nTop up in the menu 👇",
                required, available
            ),
            Lang::Ru => format!(
                "⚡️ Недостаточно энергии: нужно {}, у вас {}.\nПополните баланс в меню 👇",
                required, available
            ),
        }
    }

    pub fn error_banned_content(&self) -> &'static str {
        match self {
            Lang::En => "🚫 Your post contains banned words and cannot be submitted.",
            Lang::Ru => "🚫 Пост содержит запрещённые слова и не может быть отправлен.",
        }
    }

    pub fn error_empty_post(&self) -> &'static str {
        match self {
            Lang::En => "The message must not be empty. Please try again ✍️",
            Lang::Ru => "Сообщение не должно быть пустым. Попробуйте ещё раз ✍️",
        }
    }

    pub fn error_invalid_choice(&self) -> &'static str {
        match self {
            Lang::En => "Invalid choice",
            Lang::Ru => "Некорректный выбор",
        }
    }

    pub fn error_admin_only(&self) -> &'static str {
        match self {
            Lang::En => "⛔️ This command is available to administrators only.",
            Lang::Ru => "⛔️ Команда доступна только администраторам.",
        }
    }

    pub fn error_payments_disabled(&self) -> &'static str {
        match self {
            Lang::En => "💤 The payment gateway is not configured yet. Please contact an administrator.",
            Lang::Ru => "💤 Платёжный шлюз пока не настроен. Обратитесь к администратору.",
        }
    }

    pub fn error_invoice_failed(&self, reason: &str) -> String {
        match self {
            Lang::En => format!("❌ Failed to create an invoice: {}", reason),
            Lang::Ru => format!("❌ Не удалось создать счёт: {}", reason),
        }
    }

    /// user-facing text for ledger errors
    pub fn economy_error(&self, err: &EconomyError) -> String {
        match err {
            EconomyError::NotSubscribed(_) => self.error_not_subscribed().to_string(),
            EconomyError::UserNotFound(_) => self.error_user_not_found().to_string(),
            EconomyError::InsufficientEnergy {
                required,
                available,
                ..
            } => self.error_insufficient_energy(*required, *available),
            EconomyError::BannedContent(_) => self.error_banned_content().to_string(),
            EconomyError::EmptyPost => self.error_empty_post().to_string(),
            EconomyError::EmptyMessage => match self {
                Lang::En => "❌ The message is empty. Please send some text.".to_string(),
                Lang::Ru => "❌ Сообщение пустое. Отправьте текст.".to_string(),
            },
            EconomyError::InvalidAmount(_) => match self {
                Lang::En => "❌ The amount must be a positive number.".to_string(),
                Lang::Ru => "❌ Количество должно быть положительным числом.".to_string(),
            },
            EconomyError::InvalidDuration => match self {
                Lang::En => format!(
                    "❌ Golden card duration must be from 1 to {} hours.",
                    MAX_GOLDEN_CARD_HOURS
                ),
                Lang::Ru => format!(
                    "❌ Длительность золотой карты должна быть от 1 до {} часов.",
                    MAX_GOLDEN_CARD_HOURS
                ),
            },
            EconomyError::InvalidExchangeRate => match self {
                Lang::En => "❌ Prices are not configured right now. Please try later.".to_string(),
                Lang::Ru => "❌ Цены сейчас не настроены. Попробуйте позже.".to_string(),
            },
            EconomyError::SelfReferral(_) => match self {
                Lang::En => "❌ You cannot use your own referral link.".to_string(),
                Lang::Ru => "❌ Нельзя использовать собственную реферальную ссылку.".to_string(),
            },
            EconomyError::PostNotFound(id) => match self {
                Lang::En => format!("❌ Post #{} not found.", id),
                Lang::Ru => format!("❌ Пост #{} не найден.", id),
            },
            EconomyError::PostNotPending(id) => self.moderation_already_done(*id),
            EconomyError::PostNotApproved(id) => match self {
                Lang::En => format!("❌ Post #{} is not approved for publishing.", id),
                Lang::Ru => format!("❌ Пост #{} не одобрен для публикации.", id),
            },
            EconomyError::InvoiceNotFound(id) | EconomyError::InvoiceMismatch(id) => match self {
                Lang::En => format!("❌ Invoice #{} could not be processed.", id),
                Lang::Ru => format!("❌ Не удалось обработать счёт #{}.", id),
            },
            EconomyError::TicketNotFound(id) => match self {
                Lang::En => format!("❌ Ticket #{} not found.", id),
                Lang::Ru => format!("❌ Обращение #{} не найдено.", id),
            },
            EconomyError::TicketClosed(id) => match self {
                Lang::En => format!("🔒 Ticket #{} is closed.", id),
                Lang::Ru => format!("🔒 Обращение #{} закрыто.", id),
            },
        }
    }
}

// =============================================================================
// Welcome / menu messages
// =============================================================================

impl Lang {
    pub fn welcome_registered(&self, energy: u32) -> String {
        match self {
            Lang::En => format!(
                "👋 Welcome to Channel Admin!\n\
                You are registered and received <b>{}</b> ⚡️ starting energy.",
                energy
            ),
            Lang::Ru => format!(
                "👋 Добро пожаловать в Channel Admin!\n\
                Вы успешно зарегистрированы и получили <b>{}</b> ⚡️ стартовой энергии.",
                energy
            ),
        }
    }

    pub fn welcome_back(&self, energy: u32) -> String {
        match self {
            Lang::En => format!("👋 Welcome back! Your balance: <b>{}</b> ⚡️", energy),
            Lang::Ru => format!("👋 С возвращением! Ваш баланс: <b>{}</b> ⚡️", energy),
        }
    }

    pub fn main_menu_prompt(&self) -> &'static str {
        match self {
            Lang::En => "Choose an action from the menu 👇",
            Lang::Ru => "Выберите действие из меню 👇",
        }
    }

    pub fn use_menu_hint(&self) -> &'static str {
        match self {
            Lang::En => "🙌 Use the buttons below to control the bot.",
            Lang::Ru => "🙌 Используйте кнопки ниже для управления ботом.",
        }
    }

    pub fn balance(&self, energy: u32, active_cards: usize, post_cost: u32) -> String {
        match self {
            Lang::En => format!(
                "📊 <b>Your balance:</b>\n\
                • ⚡️ Energy: {}\n\
                • 🌟 Active golden cards: {}\n\n\
                One post costs {} ⚡️",
                energy, active_cards, post_cost
            ),
            Lang::Ru => format!(
                "📊 <b>Ваш баланс:</b>\n\
                • ⚡️ Энергия: {}\n\
                • 🌟 Активные золотые карточки: {}\n\n\
                Один пост стоит {} ⚡️",
                energy, active_cards, post_cost
            ),
        }
    }

    pub fn choose_energy_bundle(&self) -> &'static str {
        match self {
            Lang::En => "⚡️ Choose an energy bundle:",
            Lang::Ru => "⚡️ Выберите пакет энергии для пополнения:",
        }
    }

    pub fn choose_golden_duration(&self) -> &'static str {
        match self {
            Lang::En => "🌟 Choose the golden card duration:",
            Lang::Ru => "🌟 Выберите длительность золотой карточки:",
        }
    }

    pub fn help(&self, post_cost: u32, referral_bonus: u32) -> String {
        match self {
            Lang::En => format!(
                "ℹ️ <b>How it works</b>\n\n\
                • Every post costs {post_cost} ⚡️ energy\n\
                • A golden card pins your next post in the channel\n\
                • Invite friends and get {referral_bonus} ⚡️ for each of them\n\n\
                Commands: /balance, /buy_energy, /buy_golden_card, /golden_for_energy, /post, /referral, /support, /tickets"
            ),
            Lang::Ru => format!(
                "ℹ️ <b>Как это работает</b>\n\n\
                • Каждый пост стоит {post_cost} ⚡️ энергии\n\
                • Золотая карточка закрепляет ваш следующий пост в канале\n\
                • Приглашайте друзей и получайте {referral_bonus} ⚡️ за каждого\n\n\
                Команды: /balance, /buy_energy, /buy_golden_card, /golden_for_energy, /post, /referral, /support, /tickets"
            ),
        }
    }
}

// =============================================================================
// Posts
// =============================================================================

impl Lang {
    pub fn post_prompt(&self, cost: u32) -> String {
        match self {
            Lang::En => format!(
                "📝 Send the post text as a single message ({} ⚡️).\n\nPress the button below to cancel.",
                cost
            ),
            Lang::Ru => format!(
                "📝 Отправьте текст поста одним сообщением ({} ⚡️).\n\nДля отмены нажмите кнопку ниже.",
                cost
            ),
        }
    }

    pub fn post_accepted(&self, post_id: u64, pinned: bool) -> String {
        let pin = match (self, pinned) {
            (Lang::En, true) => " 📌 The post will be pinned.",
            (Lang::Ru, true) => " 📌 Пост будет закреплён.",
            _ => "",
        };
        match self {
            Lang::En => format!("✅ Post #{} accepted and sent to moderation!{}", post_id, pin),
            Lang::Ru => format!("✅ Пост #{} принят и отправлен на модерацию!{}", post_id, pin),
        }
    }

    pub fn post_approved_notice(&self, post_id: u64) -> String {
        match self {
            Lang::En => format!("🎉 Your post #{} was approved and will appear in the channel soon.", post_id),
            Lang::Ru => format!("🎉 Ваш пост #{} одобрен и скоро появится в канале.", post_id),
        }
    }

    pub fn post_rejected_notice(&self, post_id: u64, refunded: u32) -> String {
        match self {
            Lang::En => format!(
                "🙅 Your post #{} was rejected by moderators. {} ⚡️ returned to your balance.",
                post_id, refunded
            ),
            Lang::Ru => format!(
                "🙅 Ваш пост #{} отклонён модератором. {} ⚡️ возвращено на баланс.",
                post_id, refunded
            ),
        }
    }

    pub fn moderation_request(&self, post_id: u64, author: i64, pinned: bool, text: &str) -> String {
        let pin = if pinned { " 📌" } else { "" };
        match self {
            Lang::En => format!(
                "🆕 <b>Post #{}</b>{} from <code>{}</code>\n\n{}",
                post_id, pin, author, text
            ),
            Lang::Ru => format!(
                "🆕 <b>Пост #{}</b>{} от <code>{}</code>\n\n{}",
                post_id, pin, author, text
            ),
        }
    }

    pub fn moderation_done(&self, post_id: u64, approved: bool) -> String {
        match (self, approved) {
            (Lang::En, true) => format!("✅ Post #{} approved", post_id),
            (Lang::En, false) => format!("🚫 Post #{} rejected", post_id),
            (Lang::Ru, true) => format!("✅ Пост #{} одобрен", post_id),
            (Lang::Ru, false) => format!("🚫 Пост #{} отклонён", post_id),
        }
    }

    pub fn moderation_already_done(&self, post_id: u64) -> String {
        match self {
            Lang::En => format!("Post #{} was already moderated", post_id),
            Lang::Ru => format!("Пост #{} уже обработан", post_id),
        }
    }

    pub fn no_pending_posts(&self) -> &'static str {
        match self {
            Lang::En => "📭 No posts are waiting for moderation.",
            Lang::Ru => "📭 Нет постов, ожидающих модерации.",
        }
    }
}

// =============================================================================
// Payments
// =============================================================================

impl Lang {
    pub fn energy_usage(&self) -> &'static str {
        match self {
            Lang::En => "Specify the amount of energy: /buy_energy 50",
            Lang::Ru => "Укажите количество энергии: /buy_energy 50",
        }
    }

    pub fn golden_usage(&self, command: &str) -> String {
        match self {
            Lang::En => format!("Specify the duration in hours: /{} 24", command),
            Lang::Ru => format!("Укажите длительность в часах: /{} 24", command),
        }
    }

    pub fn invoice_description_energy(&self, amount: u32) -> String {
        match self {
            Lang::En => format!("Energy top-up ({}⚡️)", amount),
            Lang::Ru => format!("Пополнение энергии ({}⚡️)", amount),
        }
    }

    pub fn invoice_description_golden(&self, hours: u32) -> String {
        match self {
            Lang::En => format!("Golden card for {}h", hours),
            Lang::Ru => format!("Золотая карточка на {}ч", hours),
        }
    }

    pub fn invoice_ready(&self, price_rub: f64, amount: f64, asset: &str, pay_url: &str) -> String {
        match self {
            Lang::En => format!(
                "💳 Your invoice is ready!\n\
                Price: {:.2} ₽ ({:.2} {})\n\
                Follow the link to pay: {}",
                price_rub, amount, asset, pay_url
            ),
            Lang::Ru => format!(
                "💳 Счёт готов!\n\
                Сумма к оплате: {:.2} ₽ ({:.2} {})\n\
                Перейдите по ссылке и завершите оплату: {}",
                price_rub, amount, asset, pay_url
            ),
        }
    }

    pub fn invoice_paid_energy(&self, amount: u32, balance: u32) -> String {
        match self {
            Lang::En => format!(
                "🎉 <b>Payment received!</b>\n\n✅ Added {} ⚡️\n💳 New balance: {} ⚡️",
                amount, balance
            ),
            Lang::Ru => format!(
                "🎉 <b>Оплата получена!</b>\n\n✅ Начислено {} ⚡️\n💳 Новый баланс: {} ⚡️",
                amount, balance
            ),
        }
    }

    pub fn invoice_paid_golden(&self, hours: u32) -> String {
        match self {
            Lang::En => format!(
                "🎉 <b>Payment received!</b>\n\n🌟 Golden card for {}h added. Your next post will be pinned.",
                hours
            ),
            Lang::Ru => format!(
                "🎉 <b>Оплата получена!</b>\n\n🌟 Золотая карточка на {}ч добавлена. Следующий пост будет закреплён.",
                hours
            ),
        }
    }

    pub fn golden_bought_with_energy(&self, hours: i64, spent: u32, balance: u32) -> String {
        match self {
            Lang::En => format!(
                "🌟 Golden card for {}h purchased for {} ⚡️. Balance: {} ⚡️",
                hours, spent, balance
            ),
            Lang::Ru => format!(
                "🌟 Золотая карточка на {}ч куплена за {} ⚡️. Баланс: {} ⚡️",
                hours, spent, balance
            ),
        }
    }
}

// =============================================================================
// Referral messages
// =============================================================================

impl Lang {
    pub fn referral_link(&self, link: &str, bonus: u32, count: usize) -> String {
        match self {
            Lang::En => format!(
                "🎁 <b>Referral program</b>\n\n\
                Share your link and get {} ⚡️ for every new user:\n{}\n\n\
                Invited so far: <b>{}</b>",
                bonus, link, count
            ),
            Lang::Ru => format!(
                "🎁 <b>Реферальная программа</b>\n\n\
                Делитесь ссылкой и получайте {} ⚡️ за каждого нового пользователя:\n{}\n\n\
                Приглашено: <b>{}</b>",
                bonus, link, count
            ),
        }
    }

    pub fn referral_reward(&self, energy: u32, count: usize, celebration: bool) -> String {
        match (self, celebration) {
            (Lang::En, true) => format!(
                "🎊 <b>Referral Milestone!</b> You've reached <b>{}</b> referrals and earned {} ⚡️!",
                count, energy
            ),
            (Lang::En, false) => format!(
                "🎉 <b>Referral Reward!</b> A friend joined, you've earned {} ⚡️ (total referrals: {}).",
                energy, count
            ),
            (Lang::Ru, true) => format!(
                "🎊 <b>Рубеж рефералов!</b> У вас уже <b>{}</b> приглашённых, начислено {} ⚡️!",
                count, energy
            ),
            (Lang::Ru, false) => format!(
                "🎉 <b>Бонус за приглашение!</b> Друг присоединился, начислено {} ⚡️ (всего рефералов: {}).",
                energy, count
            ),
        }
    }
}

// =============================================================================
// Support tickets
// =============================================================================

impl Lang {
    pub fn support_usage(&self) -> &'static str {
        match self {
            Lang::En => "Describe your problem after the command: /support I can't buy energy",
            Lang::Ru => "Опишите проблему после команды: /support не могу купить энергию",
        }
    }

    pub fn ticket_opened(&self, ticket_id: u64) -> String {
        match self {
            Lang::En => format!("📨 Ticket #{} created. We will reply here.", ticket_id),
            Lang::Ru => format!("📨 Обращение #{} создано. Мы ответим здесь.", ticket_id),
        }
    }

    pub fn ticket_follow_up_prompt(&self, ticket_id: u64) -> String {
        match self {
            Lang::En => format!("✍️ Send one message to add it to ticket #{}.", ticket_id),
            Lang::Ru => format!("✍️ Отправьте сообщение, и оно будет добавлено к обращению #{}.", ticket_id),
        }
    }

    pub fn ticket_message_added(&self, ticket_id: u64) -> String {
        match self {
            Lang::En => format!("📨 Message added to ticket #{}.", ticket_id),
            Lang::Ru => format!("📨 Сообщение добавлено к обращению #{}.", ticket_id),
        }
    }

    pub fn ticket_admin_notice(&self, ticket_id: u64, user_id: i64, text: &str) -> String {
        match self {
            Lang::En => format!(
                "🆘 <b>Ticket #{}</b> from <code>{}</code>\n\n{}\n\nReply: /reply {} &lt;text&gt;",
                ticket_id, user_id, text, ticket_id
            ),
            Lang::Ru => format!(
                "🆘 <b>Обращение #{}</b> от <code>{}</code>\n\n{}\n\nОтвет: /reply {} &lt;текст&gt;",
                ticket_id, user_id, text, ticket_id
            ),
        }
    }

    pub fn ticket_reply(&self, ticket_id: u64, text: &str) -> String {
        match self {
            Lang::En => format!("💬 <b>Support reply to #{}</b>\n\n{}", ticket_id, text),
            Lang::Ru => format!("💬 <b>Ответ поддержки по #{}</b>\n\n{}", ticket_id, text),
        }
    }

    pub fn ticket_closed(&self, ticket_id: u64) -> String {
        match self {
            Lang::En => format!("🔒 Ticket #{} closed.", ticket_id),
            Lang::Ru => format!("🔒 Обращение #{} закрыто.", ticket_id),
        }
    }

    pub fn ticket_line(&self, ticket_id: u64, open: bool, messages: usize) -> String {
        let status = match (self, open) {
            (Lang::En, true) => "open",
            (Lang::En, false) => "closed",
            (Lang::Ru, true) => "открыто",
            (Lang::Ru, false) => "закрыто",
        };
        format!("• #{} — {} ({} ✉️)", ticket_id, status, messages)
    }

    pub fn no_tickets(&self) -> &'static str {
        match self {
            Lang::En => "You have no support tickets.",
            Lang::Ru => "У вас нет обращений.",
        }
    }
}

// =============================================================================
// Buttons
// =============================================================================

impl Lang {
    pub fn btn_balance(&self) -> &'static str {
        match self {
            Lang::En => "📊 Balance",
            Lang::Ru => "📊 Баланс",
        }
    }

    pub fn btn_energy(&self) -> &'static str {
        match self {
            Lang::En => "⚡️ Top up energy",
            Lang::Ru => "⚡️ Пополнить энергию",
        }
    }

    pub fn btn_golden_card(&self) -> &'static str {
        match self {
            Lang::En => "🌟 Golden card",
            Lang::Ru => "🌟 Золотая карточка",
        }
    }

    pub fn btn_post(&self) -> &'static str {
        match self {
            Lang::En => "📝 Submit a post",
            Lang::Ru => "📝 Отправить пост",
        }
    }

    pub fn btn_menu(&self) -> &'static str {
        match self {
            Lang::En => "🔙 Menu",
            Lang::Ru => "🔙 В меню",
        }
    }

    pub fn btn_cancel(&self) -> &'static str {
        match self {
            Lang::En => "🔙 Cancel",
            Lang::Ru => "🔙 Отмена",
        }
    }

    pub fn btn_hours(&self, hours: u32) -> String {
        match self {
            Lang::En => format!("{} h", hours),
            Lang::Ru => format!("{} ч", hours),
        }
    }

    pub fn btn_approve(&self) -> &'static str {
        match self {
            Lang::En => "✅ Approve",
            Lang::Ru => "✅ Одобрить",
        }
    }

    pub fn btn_reject(&self) -> &'static str {
        match self {
            Lang::En => "🚫 Reject",
            Lang::Ru => "🚫 Отклонить",
        }
    }
}

// =============================================================================
// Admin
// =============================================================================

impl Lang {
    pub fn admin_done(&self) -> &'static str {
        match self {
            Lang::En => "✅ Done.",
            Lang::Ru => "✅ Готово.",
        }
    }

    pub fn admin_usage(&self, usage: &str) -> String {
        match self {
            Lang::En => format!("Usage: {}", usage),
            Lang::Ru => format!("Использование: {}", usage),
        }
    }

    pub fn autopost_state(&self, paused: bool) -> &'static str {
        match (self, paused) {
            (Lang::En, true) => "⏸ Autopost paused.",
            (Lang::En, false) => "▶️ Autopost resumed.",
            (Lang::Ru, true) => "⏸ Автопостинг приостановлен.",
            (Lang::Ru, false) => "▶️ Автопостинг возобновлён.",
        }
    }

    pub fn banned_words_list(&self, words: &[String]) -> String {
        let list = if words.is_empty() {
            "—".to_string()
        } else {
            words.join(", ")
        };
        match self {
            Lang::En => format!("🚫 Banned words ({}): {}", words.len(), list),
            Lang::Ru => format!("🚫 Запрещённые слова ({}): {}", words.len(), list),
        }
    }

    pub fn stats(
        &self,
        users: usize,
        total_energy: u64,
        pending: usize,
        approved: usize,
        published: usize,
        open_tickets: usize,
    ) -> String {
        match self {
            Lang::En => format!(
                "📈 <b>Stats</b>\n\
                • Users: {users}\n\
                • Energy in circulation: {total_energy}\n\
                • Posts pending/approved/published: {pending}/{approved}/{published}\n\
                • Open tickets: {open_tickets}"
            ),
            Lang::Ru => format!(
                "📈 <b>Статистика</b>\n\
                • Пользователей: {users}\n\
                • Энергии в обороте: {total_energy}\n\
                • Посты на модерации/одобрены/опубликованы: {pending}/{approved}/{published}\n\
                • Открытых обращений: {open_tickets}"
            ),
        }
    }
}
