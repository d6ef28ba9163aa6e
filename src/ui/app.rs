use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Local;
use eframe::egui::{self, Align, Color32, Key, Layout, RichText, Ui};

use crate::alert::{AlertSink, NullAlert, SpeakerAlert};
use crate::api::{ApiSharedState, RuntimeSnapshot};
use crate::clock::{SystemClock, TimeSource};
use crate::diagnostics::TickStats;
use crate::settings::{Settings, save_settings};
use crate::timer::countdown::{Countdown, CountdownPhase};
use crate::timer::format::{TimeParts, zero_pad};
use crate::timer::stopwatch::{Stopwatch, StopwatchPhase};

const MAX_TICK_STEPS_PER_UPDATE: usize = 1024;
const API_PUBLISH_INTERVAL: Duration = Duration::from_millis(50);

const DIGIT_COLOR: Color32 = Color32::from_rgb(255, 214, 117);
const ENDING_COLOR: Color32 = Color32::from_rgb(255, 101, 101);
const HEADING_COLOR: Color32 = Color32::from_rgb(104, 221, 205);
const LABEL_COLOR: Color32 = Color32::from_rgb(169, 188, 209);

pub fn run_gui(
    settings: Settings,
    settings_path: PathBuf,
    muted: bool,
    api_state: Option<Arc<Mutex<ApiSharedState>>>,
    api_bind: String,
    api_port: u16,
) -> Result<()> {
    let native_options = eframe::NativeOptions {
        vsync: false,
        viewport: egui::ViewportBuilder::default()
            .with_title("Stopclock")
            .with_inner_size([760.0, 560.0])
            .with_min_inner_size([560.0, 420.0]),
        ..Default::default()
    };

    let app = StopclockApp::new(settings, settings_path, muted, api_state, api_bind, api_port);

    eframe::run_native(
        "Stopclock",
        native_options,
        Box::new(move |cc| {
            configure_theme(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch Stopclock GUI: {err}"))?;

    Ok(())
}

fn configure_theme(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.override_text_color = Some(Color32::from_rgb(226, 234, 246));
    visuals.panel_fill = Color32::from_rgb(8, 16, 26);
    visuals.window_fill = Color32::from_rgb(12, 20, 32);
    visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(10, 18, 30);
    visuals.widgets.inactive.bg_fill = Color32::from_rgb(16, 24, 38);
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(26, 42, 62);
    visuals.widgets.active.bg_fill = Color32::from_rgb(34, 60, 88);
    visuals.selection.bg_fill = Color32::from_rgb(43, 148, 178);
    ctx.set_visuals(visuals);
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum View {
    Home,
    Stopwatch,
    Countdown,
}

struct StopclockApp {
    clock: SystemClock,
    stopwatch: Stopwatch,
    countdown: Countdown,
    alert: Box<dyn AlertSink>,
    settings: Settings,
    settings_path: PathBuf,
    view: View,
    status_message: Option<(String, Instant)>,
    tick_step: Duration,
    next_tick: Instant,
    tick_stats: TickStats,
    api_state: Option<Arc<Mutex<ApiSharedState>>>,
    api_bind: String,
    api_port: u16,
    next_api_publish: Instant,
}

impl StopclockApp {
    fn new(
        settings: Settings,
        settings_path: PathBuf,
        muted: bool,
        api_state: Option<Arc<Mutex<ApiSharedState>>>,
        api_bind: String,
        api_port: u16,
    ) -> Self {
        let alert: Box<dyn AlertSink> = if muted {
            Box::new(NullAlert)
        } else {
            Box::new(SpeakerAlert::new(settings.alert_sound.clone()))
        };
        let tick_step = Duration::from_millis(settings.tick_interval_ms.max(1));
        let now = Instant::now();
        Self {
            clock: SystemClock,
            stopwatch: Stopwatch::new(),
            countdown: Countdown::with_finish_hold(settings.finish_hold_ms as i64),
            alert,
            settings,
            settings_path,
            view: View::Home,
            status_message: None,
            tick_step,
            next_tick: now,
            tick_stats: TickStats::new(300, tick_step),
            api_state,
            api_bind,
            api_port,
            next_api_publish: now,
        }
    }

    fn set_status(&mut self, text: impl Into<String>, ttl: Duration) {
        self.status_message = Some((text.into(), Instant::now() + ttl));
    }

    fn simulate_single_step(&mut self, now: Instant) {
        let now_ms = self.clock.now_ms();
        self.stopwatch.advance(now_ms);

        let was_finished = self.countdown.phase() == CountdownPhase::Finished;
        let tick = self.countdown.advance(now_ms);
        if tick.alert && self.settings.alert_enabled {
            self.alert.play_alert_once();
        }
        if tick.finished {
            self.set_status("Countdown finished.", Duration::from_secs(3));
        }
        if was_finished && self.countdown.in_setup() {
            // display hold expired; make sure the bell is silent for setup
            self.alert.stop_alert();
        }

        if now >= self.next_api_publish {
            self.publish_api_state(now_ms);
            self.next_api_publish = now + API_PUBLISH_INTERVAL;
        }
    }

    fn simulate(&mut self) {
        let mut now = Instant::now();
        let mut steps = 0_usize;
        while now >= self.next_tick && steps < MAX_TICK_STEPS_PER_UPDATE {
            let step_start = now;
            self.simulate_single_step(now);
            self.next_tick += self.tick_step;
            steps += 1;
            now = Instant::now();
            self.tick_stats.record_tick(now.saturating_duration_since(step_start));
        }
        if steps == MAX_TICK_STEPS_PER_UPDATE && now >= self.next_tick {
            // fell far behind (e.g. suspended); re-anchor instead of spinning
            self.next_tick = now + self.tick_step;
        }
    }

    fn publish_api_state(&self, now_ms: i64) {
        let Some(shared) = &self.api_state else {
            return;
        };
        let Ok(mut guard) = shared.lock() else {
            return;
        };
        let stopwatch_parts = crate::timer::format::decompose(self.stopwatch.elapsed_ms());
        let countdown_parts = self.countdown.display_parts();
        guard.runtime = RuntimeSnapshot {
            iso_local: Local::now().to_rfc3339(),
            stopwatch_running: self.stopwatch.is_running(),
            stopwatch_elapsed_ms: self.stopwatch.elapsed_ms(),
            stopwatch_clock: stopwatch_parts.clock_text(),
            countdown_phase: phase_label(self.countdown.phase()).to_string(),
            countdown_running: self.countdown.is_running(),
            countdown_remaining_ms: self.countdown.remaining_ms(),
            countdown_original_ms: self.countdown.original_ms(),
            countdown_clock: countdown_parts.clock_text(),
            countdown_alert_fired: self.countdown.alert_fired(),
            updated_unix_ms: now_ms,
        };
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        let now_ms = self.clock.now_ms();
        match self.view {
            View::Home => {}
            View::Stopwatch => {
                if key_pressed(ctx, Key::Space) || key_pressed(ctx, Key::Enter) {
                    if self.stopwatch.is_running() {
                        self.stopwatch.stop(now_ms);
                    } else {
                        self.stopwatch.start(now_ms);
                    }
                }
                if key_pressed(ctx, Key::R) {
                    self.stopwatch.start(now_ms);
                }
                if key_pressed(ctx, Key::C) {
                    self.stopwatch.reset();
                }
                if key_pressed(ctx, Key::Escape) {
                    self.stopwatch.stop(now_ms);
                    self.view = View::Home;
                }
            }
            View::Countdown => {
                if self.countdown.in_setup() {
                    for (key, digit) in DIGIT_KEYS {
                        if key_pressed(ctx, key) {
                            self.countdown.push_digit(digit);
                        }
                    }
                    if key_pressed(ctx, Key::Enter) {
                        self.commit_countdown();
                    }
                    if key_pressed(ctx, Key::Backspace) || key_pressed(ctx, Key::Delete) {
                        self.countdown.clear_digits();
                    }
                } else {
                    if key_pressed(ctx, Key::Space) || key_pressed(ctx, Key::Enter) {
                        self.countdown.toggle(now_ms);
                    }
                    if key_pressed(ctx, Key::C) {
                        self.reset_countdown();
                    }
                }
                if key_pressed(ctx, Key::Escape) {
                    self.countdown.pause(now_ms);
                    self.alert.stop_alert();
                    self.view = View::Home;
                }
            }
        }
    }

    fn commit_countdown(&mut self) {
        if self.countdown.commit() {
            self.set_status(
                format!(
                    "Countdown set: {}",
                    self.countdown.display_parts().clock_text()
                ),
                Duration::from_secs(2),
            );
        }
    }

    fn reset_countdown(&mut self) {
        self.countdown.reset();
        self.alert.stop_alert();
    }

    fn show_header(&mut self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.label(
                RichText::new("Stopclock")
                    .size(26.0)
                    .color(Color32::from_rgb(96, 228, 206))
                    .strong(),
            );
            ui.separator();
            ui.label(
                RichText::new(Local::now().format("%H:%M:%S").to_string())
                    .size(20.0)
                    .color(DIGIT_COLOR)
                    .strong(),
            );
            ui.separator();
            ui.label(
                RichText::new(Local::now().format("%A, %B %d %Y").to_string())
                    .size(16.0)
                    .color(LABEL_COLOR),
            );
        });
        if let Some((msg, _)) = &self.status_message {
            ui.label(
                RichText::new(msg)
                    .color(Color32::from_rgb(111, 228, 134))
                    .strong(),
            );
        }
    }

    fn show_home(&mut self, ui: &mut Ui) {
        ui.add_space(24.0);
        ui.heading(RichText::new("Pick a timer").color(HEADING_COLOR).strong());
        ui.add_space(12.0);
        if big_button(ui, "Stopwatch") {
            self.view = View::Stopwatch;
        }
        ui.add_space(8.0);
        if big_button(ui, "Countdown") {
            self.countdown.enter_setup();
            self.alert.stop_alert();
            self.view = View::Countdown;
        }
    }

    fn show_stopwatch(&mut self, ui: &mut Ui) {
        ui.heading(RichText::new("Stopwatch").color(HEADING_COLOR).strong());
        ui.add_space(12.0);
        show_time_display(
            ui,
            crate::timer::format::decompose(self.stopwatch.elapsed_ms()),
            false,
        );
        ui.add_space(16.0);

        let now_ms = self.clock.now_ms();
        ui.horizontal(|ui| {
            match self.stopwatch.phase() {
                StopwatchPhase::Idle => {
                    if ui.button("Start").clicked() {
                        self.stopwatch.start(now_ms);
                    }
                }
                StopwatchPhase::Running => {
                    if ui.button("Stop").clicked() {
                        self.stopwatch.stop(now_ms);
                    }
                }
                StopwatchPhase::Paused => {
                    if ui.button("Resume").clicked() {
                        self.stopwatch.start(now_ms);
                    }
                }
            }
            if ui.button("Clear").clicked() {
                self.stopwatch.reset();
            }
            if ui.button("Back").clicked() {
                self.stopwatch.reset();
                self.view = View::Home;
            }
        });
        ui.add_space(8.0);
        ui.label(
            RichText::new("Space/Enter start-stop  |  R resume  |  C clear  |  Esc back")
                .color(LABEL_COLOR),
        );
    }

    fn show_countdown(&mut self, ui: &mut Ui) {
        ui.heading(RichText::new("Countdown").color(HEADING_COLOR).strong());
        ui.add_space(12.0);
        show_time_display(ui, self.countdown.display_parts(), self.countdown.in_ending_window());
        ui.add_space(16.0);

        if self.countdown.in_setup() {
            self.show_numpad(ui);
        } else {
            self.show_countdown_controls(ui);
        }
        ui.add_space(8.0);
        let hint = if self.countdown.in_setup() {
            "Digits enter HHMMSS  |  Enter set  |  Backspace clear  |  Esc back"
        } else {
            "Space/Enter start-pause  |  C reset  |  Esc back"
        };
        ui.label(RichText::new(hint).color(LABEL_COLOR));
    }

    fn show_numpad(&mut self, ui: &mut Ui) {
        egui::Grid::new("numpad_grid").spacing([6.0, 6.0]).show(ui, |ui| {
            for (index, digit) in [7_u8, 8, 9, 4, 5, 6, 1, 2, 3].iter().enumerate() {
                if numpad_button(ui, &digit.to_string()) {
                    self.countdown.push_digit(*digit);
                }
                if index % 3 == 2 {
                    ui.end_row();
                }
            }
            if numpad_button(ui, "Clear") {
                self.countdown.clear_digits();
            }
            if numpad_button(ui, "0") {
                self.countdown.push_digit(0);
            }
            let can_commit = !self.countdown.digits().is_empty();
            if ui
                .add_enabled(
                    can_commit,
                    egui::Button::new(RichText::new("Set").size(18.0).strong())
                        .min_size(egui::vec2(64.0, 44.0)),
                )
                .clicked()
            {
                self.commit_countdown();
            }
            ui.end_row();
        });
        ui.add_space(8.0);
        if ui.button("Back").clicked() {
            self.alert.stop_alert();
            self.view = View::Home;
        }
    }

    fn show_countdown_controls(&mut self, ui: &mut Ui) {
        let now_ms = self.clock.now_ms();
        ui.horizontal(|ui| {
            let toggle_label = if self.countdown.is_running() {
                "Pause"
            } else {
                "Start"
            };
            if ui.button(toggle_label).clicked() {
                self.countdown.toggle(now_ms);
            }
            if ui.button("Reset").clicked() {
                self.reset_countdown();
            }
            if ui.button("Back").clicked() {
                self.countdown.pause(now_ms);
                self.alert.stop_alert();
                self.view = View::Home;
            }
        });
    }
}

impl eframe::App for StopclockApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some((_, expires_at)) = &self.status_message
            && Instant::now() >= *expires_at
        {
            self.status_message = None;
        }

        self.handle_keyboard(ctx);
        self.simulate();

        egui::TopBottomPanel::top("header")
            .resizable(false)
            .show(ctx, |ui| self.show_header(ui));

        egui::TopBottomPanel::bottom("footer")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    if ui
                        .checkbox(&mut self.settings.alert_enabled, "Alert sound")
                        .changed()
                    {
                        match save_settings(&self.settings_path, &self.settings) {
                            Ok(()) => self.set_status("Settings saved.", Duration::from_secs(2)),
                            Err(err) => {
                                self.set_status(
                                    format!("Persist failed: {err}"),
                                    Duration::from_secs(4),
                                );
                            }
                        }
                        if !self.settings.alert_enabled {
                            self.alert.stop_alert();
                        }
                    }
                    ui.separator();
                    ui.label(
                        RichText::new(format!(
                            "Tick {} ms | late ticks {}",
                            self.settings.tick_interval_ms,
                            self.tick_stats.late_ticks()
                        ))
                        .color(LABEL_COLOR),
                    );
                    if self.api_state.is_some() {
                        ui.separator();
                        ui.label(
                            RichText::new(format!(
                                "API http://{}:{}/v1/state",
                                self.api_bind, self.api_port
                            ))
                            .color(Color32::from_rgb(120, 205, 192)),
                        );
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.with_layout(Layout::top_down(Align::Min), |ui| match self.view {
                View::Home => self.show_home(ui),
                View::Stopwatch => self.show_stopwatch(ui),
                View::Countdown => self.show_countdown(ui),
            });
        });

        let wait = self.next_tick.saturating_duration_since(Instant::now());
        ctx.request_repaint_after(wait.min(self.tick_step));
    }
}

const DIGIT_KEYS: [(Key, u8); 10] = [
    (Key::Num0, 0),
    (Key::Num1, 1),
    (Key::Num2, 2),
    (Key::Num3, 3),
    (Key::Num4, 4),
    (Key::Num5, 5),
    (Key::Num6, 6),
    (Key::Num7, 7),
    (Key::Num8, 8),
    (Key::Num9, 9),
];

fn key_pressed(ctx: &egui::Context, key: Key) -> bool {
    ctx.input(|input| input.key_pressed(key))
}

fn phase_label(phase: CountdownPhase) -> &'static str {
    match phase {
        CountdownPhase::Setup => "setup",
        CountdownPhase::Armed => "armed",
        CountdownPhase::Running => "running",
        CountdownPhase::Finished => "finished",
    }
}

fn show_time_display(ui: &mut Ui, parts: TimeParts, ending: bool) {
    let color = if ending { ENDING_COLOR } else { DIGIT_COLOR };
    ui.horizontal(|ui| {
        ui.label(
            RichText::new(format!(
                "{}:{}:{}",
                zero_pad(parts.hours, 2),
                zero_pad(parts.minutes, 2),
                zero_pad(parts.seconds, 2)
            ))
            .size(56.0)
            .monospace()
            .color(color)
            .strong(),
        );
        ui.label(
            RichText::new(format!(".{}", zero_pad(parts.centis, 2)))
                .size(34.0)
                .monospace()
                .color(color),
        );
    });
}

fn big_button(ui: &mut Ui, label: &str) -> bool {
    ui.add(
        egui::Button::new(RichText::new(label).size(20.0).strong())
            .min_size(egui::vec2(220.0, 48.0)),
    )
    .clicked()
}

fn numpad_button(ui: &mut Ui, label: &str) -> bool {
    ui.add(
        egui::Button::new(RichText::new(label).size(18.0).strong())
            .min_size(egui::vec2(64.0, 44.0)),
    )
    .clicked()
}
