use std::collections::{BTreeMap, HashMap};

use crate::models::{BotSettings, Invoice, Post, SupportTicket, User};

/// backing store for the economy service; reads hand out copies
pub trait Storage: Send {
    fn get_user(&self, user_id: i64) -> Option<User>;
    fn save_user(&mut self, user: User);
    fn list_users(&self) -> Vec<User>;

    /// assigns the next post id and returns it
    fn add_post(&mut self, post: Post) -> u64;
    fn save_post(&mut self, post: Post);
    fn get_post(&self, post_id: u64) -> Option<Post>;
    fn list_posts(&self) -> Vec<Post>;

    fn save_invoice(&mut self, invoice: Invoice);
    fn get_invoice(&self, invoice_id: i64) -> Option<Invoice>;
    fn list_invoices(&self) -> Vec<Invoice>;

    /// assigns the next ticket id and returns it
    fn add_ticket(&mut self, ticket: SupportTicket) -> u64;
    fn save_ticket(&mut self, ticket: SupportTicket);
    fn get_ticket(&self, ticket_id: u64) -> Option<SupportTicket>;
    fn list_tickets(&self) -> Vec<SupportTicket>;

    fn get_settings(&self) -> BotSettings;
    fn save_settings(&mut self, settings: BotSettings);
}

#[derive(Debug, Default)]
pub struct InMemoryStorage {
    users: HashMap<i64, User>,
    posts: BTreeMap<u64, Post>,
    invoices: BTreeMap<i64, Invoice>,
    tickets: BTreeMap<u64, SupportTicket>,
    settings: Option<BotSettings>,
    last_post_id: u64,
    last_ticket_id: u64,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn get_user(&self, user_id: i64) -> Option<User> {
        self.users.get(&user_id).cloned()
    }

    fn save_user(&mut self, user: User) {
        self.users.insert(user.user_id, user);
    }

    fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.values().cloned().collect();
        users.sort_by_key(|user| user.user_id);
        users
    }

    fn add_post(&mut self, mut post: Post) -> u64 {
        self.last_post_id += 1;
        post.post_id = self.last_post_id;
        self.posts.insert(post.post_id, post);
        self.last_post_id
    }

    fn save_post(&mut self, post: Post) {
        self.last_post_id = self.last_post_id.max(post.post_id);
        self.posts.insert(post.post_id, post);
    }

    fn get_post(&self, post_id: u64) -> Option<Post> {
        self.posts.get(&post_id).cloned()
    }

    fn list_posts(&self) -> Vec<Post> {
        self.posts.values().cloned().collect()
    }

    fn save_invoice(&mut self, invoice: Invoice) {
        self.invoices.insert(invoice.invoice_id, invoice);
    }

    fn get_invoice(&self, invoice_id: i64) -> Option<Invoice> {
        self.invoices.get(&invoice_id).cloned()
    }

    fn list_invoices(&self) -> Vec<Invoice> {
        self.invoices.values().cloned().collect()
    }

    fn add_ticket(&mut self, mut ticket: SupportTicket) -> u64 {
        self.last_ticket_id += 1;
        ticket.ticket_id = self.last_ticket_id;
        self.tickets.insert(ticket.ticket_id, ticket);
        self.last_ticket_id
    }

    fn save_ticket(&mut self, ticket: SupportTicket) {
        self.last_ticket_id = self.last_ticket_id.max(ticket.ticket_id);
        self.tickets.insert(ticket.ticket_id, ticket);
    }

    fn get_ticket(&self, ticket_id: u64) -> Option<SupportTicket> {
        self.tickets.get(&ticket_id).cloned()
    }

    fn list_tickets(&self) -> Vec<SupportTicket> {
        self.tickets.values().cloned().collect()
    }

    fn get_settings(&self) -> BotSettings {
        self.settings.unwrap_or_default()
    }

    fn save_settings(&mut self, settings: BotSettings) {
        self.settings = Some(settings);
    }
}
