use std::rc::Rc;

use log::info;

use crate::config::Settings;
use crate::host::Host;
use crate::render::Renderer;
use crate::save::SaveCoordinator;
use crate::watch::ChangeWatcher;

/// Lifeboat wired to one page.
pub struct App<H: Host> {
    host: Rc<H>,
    settings: Settings,
    saves: Rc<SaveCoordinator<H>>,
    watcher: Rc<ChangeWatcher<H>>,
}

impl<H: Host> App<H> {
    pub fn new(host: Rc<H>, settings: Settings) -> Self {
        let saves = Rc::new(SaveCoordinator::new(
            Rc::clone(&host),
            settings.timing.clone(),
        ));
        let renderer = Rc::new(Renderer::new(
            Rc::clone(&host),
            Rc::clone(&saves),
            settings.picker_icon.clone(),
        ));
        let watcher = Rc::new(ChangeWatcher::new(Rc::clone(&host), renderer));
        Self {
            host,
            settings,
            saves,
            watcher,
        }
    }

    pub fn saves(&self) -> &SaveCoordinator<H> {
        &self.saves
    }

    /// Wait for the board to render, then decorate it and start watching.
    pub async fn run(&self) {
        self.host
            .sleep(self.settings.timing.startup_delay())
            .await;
        self.watcher.start();
    }

    /// Run on the host's executor.
    pub fn start(self) {
        info!("lifeboat extension loaded");
        let host = Rc::clone(&self.host);
        host.spawn(Box::pin(async move { self.run().await }));
    }
}
