use crate::browser;
use crate::session::{RoundPhase, Session};
use anyhow::{anyhow, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlButtonElement;

pub const LUCKY_PHRASES: [&str; 16] = [
    "恭喜發財！",
    "財源滾滾！",
    "好運連連！",
    "心想事成！",
    "步步高升！",
    "大吉大利！",
    "福星高照！",
    "萬事如意！",
    "一帆風順！",
    "五福臨門！",
    "六六大順！",
    "七星高照！",
    "八面威風！",
    "九九歸一！",
    "十全十美！",
    "百發百中！",
];

pub const START_PHRASE: &str = "遊戲開始！加油！";
pub const PAUSE_PHRASE: &str = "遊戲暫停";
pub const RESUME_PHRASE: &str = "遊戲繼續！";

pub fn lucky_phrase<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    LUCKY_PHRASES.choose(rng).copied().unwrap_or(LUCKY_PHRASES[0])
}

/// Label of the pause button for a phase.
pub fn pause_label(phase: RoundPhase) -> &'static str {
    if phase == RoundPhase::Paused {
        "繼續"
    } else {
        "暫停"
    }
}

pub const GAME_CONTAINER: &str = ".game-container";
pub const LOAD_FAILURE_HTML: &str =
    "<h1>🐊 打鱷魚遊戲 🐊</h1><p>遊戲載入中遇到問題，請重新整理頁面</p>";

/// Replace the game area with a short notice when the game cannot start.
pub fn show_load_failure() -> Result<()> {
    browser::document()?
        .query_selector(GAME_CONTAINER)
        .map_err(|err| anyhow!("Invalid selector {} : {:#?}", GAME_CONTAINER, err))?
        .ok_or_else(|| anyhow!("No element matches '{}'", GAME_CONTAINER))?
        .set_inner_html(LOAD_FAILURE_HTML);
    Ok(())
}

/// Score/Time Display. Shows what it is told, decides nothing.
pub trait ScorePanel {
    fn show_counters(&mut self, score: u32, coins: u32, time_left: u32) -> Result<()>;
    fn show_phrase(&mut self, phrase: &str) -> Result<()>;
    fn hide_phrase(&mut self) -> Result<()>;
    fn show_controls(&mut self, phase: RoundPhase) -> Result<()>;
    fn show_game_over(&mut self, session: &Session) -> Result<()>;
    fn hide_game_over(&mut self) -> Result<()>;
}

mod ids {
    pub const SCORE: &str = "score";
    pub const TIMER: &str = "timer";
    pub const COINS: &str = "coins";
    pub const PHRASE: &str = "luckyPhrase";
    pub const GAME_OVER: &str = "gameOver";
    pub const FINAL_SCORE_DISPLAY: &str = "finalScoreDisplay";
    pub const FINAL_COINS_DISPLAY: &str = "finalCoinsDisplay";
    pub const RECORD: &str = "gameRecord";
    pub const RECORD_DATE: &str = "gameDate";
    pub const RECORD_START: &str = "startTime";
    pub const RECORD_END: &str = "endTime";
    pub const RECORD_SCORE: &str = "finalScore";
    pub const RECORD_COINS: &str = "finalCoins";
}

const LOCALE: &str = "zh-TW";
const HIDDEN_CLASS: &str = "hidden";

/// Score panel on the page's DOM elements.
#[derive(Default)]
pub struct DomScorePanel;

impl DomScorePanel {
    fn set_text(id: &str, text: &str) -> Result<()> {
        browser::element_by_id(id)?.set_text_content(Some(text));
        Ok(())
    }

    fn set_display(id: &str, value: &str) -> Result<()> {
        browser::html_element_by_id(id)?
            .style()
            .set_property("display", value)
            .map_err(|err| anyhow!("Could not set display of '{}' : {:#?}", id, err))
    }

    fn button(id: &str) -> Result<HtmlButtonElement> {
        browser::element_by_id(id)?
            .dyn_into::<HtmlButtonElement>()
            .map_err(|element| anyhow!("Error converting {:#?} to HtmlButtonElement", element))
    }

    fn date(ms: f64) -> js_sys::Date {
        js_sys::Date::new(&JsValue::from_f64(ms))
    }
}

impl ScorePanel for DomScorePanel {
    fn show_counters(&mut self, score: u32, coins: u32, time_left: u32) -> Result<()> {
        Self::set_text(ids::SCORE, &score.to_string())?;
        Self::set_text(ids::TIMER, &time_left.to_string())?;
        Self::set_text(ids::COINS, &coins.to_string())
    }

    fn show_phrase(&mut self, phrase: &str) -> Result<()> {
        let element = browser::element_by_id(ids::PHRASE)?;
        element.set_text_content(Some(phrase));
        element
            .class_list()
            .remove_1(HIDDEN_CLASS)
            .map_err(|err| anyhow!("Could not reveal phrase : {:#?}", err))
    }

    fn hide_phrase(&mut self) -> Result<()> {
        browser::element_by_id(ids::PHRASE)?
            .class_list()
            .add_1(HIDDEN_CLASS)
            .map_err(|err| anyhow!("Could not hide phrase : {:#?}", err))
    }

    fn show_controls(&mut self, phase: RoundPhase) -> Result<()> {
        Self::button(browser::html::START_BUTTON_ID)?.set_disabled(phase.is_active());
        let pause = Self::button(browser::html::PAUSE_BUTTON_ID)?;
        pause.set_disabled(!phase.is_active());
        pause.set_text_content(Some(pause_label(phase)));
        Ok(())
    }

    fn show_game_over(&mut self, session: &Session) -> Result<()> {
        let score = session.score().to_string();
        let coins = session.coins().to_string();
        Self::set_text(ids::FINAL_SCORE_DISPLAY, &score)?;
        Self::set_text(ids::FINAL_COINS_DISPLAY, &coins)?;
        Self::set_display(ids::GAME_OVER, "block")?;

        let started = Self::date(session.started_at().unwrap_or_else(browser::wall_clock));
        let ended = Self::date(session.ended_at().unwrap_or_else(browser::wall_clock));
        Self::set_text(
            ids::RECORD_DATE,
            &String::from(started.to_locale_date_string(LOCALE, &JsValue::UNDEFINED)),
        )?;
        Self::set_text(
            ids::RECORD_START,
            &String::from(started.to_locale_time_string(LOCALE)),
        )?;
        Self::set_text(
            ids::RECORD_END,
            &String::from(ended.to_locale_time_string(LOCALE)),
        )?;
        Self::set_text(ids::RECORD_SCORE, &score)?;
        Self::set_text(ids::RECORD_COINS, &coins)?;
        Self::set_display(ids::RECORD, "block")
    }

    fn hide_game_over(&mut self) -> Result<()> {
        Self::set_display(ids::GAME_OVER, "none")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn phrases_are_distinct() {
        let unique: HashSet<&str> = LUCKY_PHRASES.iter().copied().collect();
        assert_eq!(unique.len(), LUCKY_PHRASES.len());
    }

    #[test]
    fn lucky_phrase_comes_from_the_list() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..50 {
            assert!(LUCKY_PHRASES.contains(&lucky_phrase(&mut rng)));
        }
    }

    #[test]
    fn pause_button_reads_continue_only_while_paused() {
        assert_eq!(pause_label(RoundPhase::Paused), "繼續");
        assert_eq!(pause_label(RoundPhase::Running), "暫停");
        assert_eq!(pause_label(RoundPhase::Idle), "暫停");
    }
}
