use tokio::sync::watch;

/// Host application activity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Foreground,
    Background,
}

/// Host-side handle for publishing activity transitions. The receiver half
/// feeds the refresh scheduler; only real transitions notify subscribers.
pub struct ActivityPublisher {
    tx: watch::Sender<Activity>,
}

impl ActivityPublisher {
    pub fn foreground(&self) {
        self.set(Activity::Foreground);
    }

    pub fn background(&self) {
        self.set(Activity::Background);
    }

    pub fn set(&self, activity: Activity) {
        self.tx.send_if_modified(|current| {
            if *current == activity {
                false
            } else {
                *current = activity;
                true
            }
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<Activity> {
        self.tx.subscribe()
    }
}

/// Create the activity channel, starting in the foreground.
pub fn activity_channel() -> (ActivityPublisher, watch::Receiver<Activity>) {
    let (tx, rx) = watch::channel(Activity::Foreground);
    (ActivityPublisher { tx }, rx)
}
