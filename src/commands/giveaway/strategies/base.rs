use serenity::model::id::UserId;

pub struct DrawOptions {
    entries: Vec<UserId>,
    count: usize,
    forced: Option<UserId>,
}

impl DrawOptions {
    pub fn new(entries: Vec<UserId>, count: usize, forced: Option<UserId>) -> Self {
        DrawOptions {
            entries,
            count,
            forced,
        }
    }

    // Returns the entrant pool the draw runs over.
    pub fn entries(&self) -> &[UserId] {
        &self.entries
    }

    // Returns how many winners were requested at creation time.
    pub fn count(&self) -> usize {
        self.count
    }

    // Returns the override that, when set, wins unconditionally.
    pub fn forced(&self) -> Option<UserId> {
        self.forced
    }
}

pub trait WinnerStrategy: Send + Sync {
    // Returns an ordered winners list in according with the passed
    // draw options.
    fn roll(&self, options: &DrawOptions) -> Vec<UserId>;
}
