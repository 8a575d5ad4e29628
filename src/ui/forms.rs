use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Category, NewSong, Song};
use crate::numerals::to_ascii_digits;

/// Fields of the add-song form, in focus order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub(crate) enum SongField {
    #[default]
    Title,
    Artist,
    Album,
    Lyricist,
    Composer,
    Era,
    Genre,
    Year,
    Lyrics,
    Notes,
    AudioUrl,
    VideoUrl,
}

impl SongField {
    pub(crate) const ALL: [SongField; 12] = [
        SongField::Title,
        SongField::Artist,
        SongField::Album,
        SongField::Lyricist,
        SongField::Composer,
        SongField::Era,
        SongField::Genre,
        SongField::Year,
        SongField::Lyrics,
        SongField::Notes,
        SongField::AudioUrl,
        SongField::VideoUrl,
    ];

    fn index(self) -> usize {
        SongField::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            SongField::Title => "শিরোনাম",
            SongField::Artist => "শিল্পী",
            SongField::Album => "অ্যালবাম",
            SongField::Lyricist => "গীতিকার",
            SongField::Composer => "সুরকার",
            SongField::Era => "যুগ",
            SongField::Genre => "ধরণ",
            SongField::Year => "প্রকাশকাল",
            SongField::Lyrics => "গানের কথা",
            SongField::Notes => "বিশেষ তথ্য",
            SongField::AudioUrl => "অডিও লিঙ্ক",
            SongField::VideoUrl => "ভিডিও লিঙ্ক",
        }
    }

    /// Category whose existing values feed autocomplete for this field.
    pub(crate) fn category(self) -> Option<Category> {
        match self {
            SongField::Artist => Some(Category::Artist),
            SongField::Lyricist => Some(Category::Lyricist),
            SongField::Composer => Some(Category::Composer),
            SongField::Era => Some(Category::Era),
            SongField::Genre => Some(Category::Genre),
            _ => None,
        }
    }
}

/// Form state for song creation, including autocomplete tracking.
#[derive(Default, Clone)]
pub(crate) struct SongForm {
    values: [String; 12],
    pub(crate) active: SongField,
    pub(crate) error: Option<String>,
    pub(crate) suggestion: Option<String>,
    pub(crate) autocomplete_disabled: bool,
}

impl SongForm {
    pub(crate) fn value(&self, field: SongField) -> &str {
        &self.values[field.index()]
    }

    fn value_mut(&mut self, field: SongField) -> &mut String {
        &mut self.values[field.index()]
    }

    /// Move focus forward, wrapping at the end.
    pub(crate) fn next_field(&mut self) {
        let next = (self.active.index() + 1) % SongField::ALL.len();
        self.focus(SongField::ALL[next]);
    }

    pub(crate) fn previous_field(&mut self) {
        let len = SongField::ALL.len();
        let previous = (self.active.index() + len - 1) % len;
        self.focus(SongField::ALL[previous]);
    }

    fn focus(&mut self, field: SongField) {
        self.active = field;
        self.suggestion = None;
        self.autocomplete_disabled = false;
    }

    /// Insert a character into the active field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.autocomplete_disabled = false;
        let field = self.active;
        self.value_mut(field).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
        self.autocomplete_disabled = false;
    }

    /// Validate the inputs and build a song ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<NewSong> {
        let title = self.value(SongField::Title).trim();
        if title.is_empty() {
            return Err(anyhow!("গানের শিরোনাম আবশ্যক।"));
        }

        let year_raw = to_ascii_digits(self.value(SongField::Year).trim());
        let release_year = if year_raw.is_empty() {
            None
        } else {
            match year_raw.parse::<i32>() {
                Ok(year) if year > 0 => Some(year),
                _ => return Err(anyhow!("প্রকাশকাল একটি ধনাত্মক সংখ্যা হতে হবে।")),
            }
        };

        let optional = |field: SongField| {
            let value = self.value(field).trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        Ok(NewSong {
            title: title.to_string(),
            artist: optional(SongField::Artist),
            album: optional(SongField::Album),
            lyricist: optional(SongField::Lyricist),
            composer: optional(SongField::Composer),
            era: optional(SongField::Era),
            genre: optional(SongField::Genre),
            release_year,
            lyrics: optional(SongField::Lyrics),
            is_favorite: false,
            audio_url: optional(SongField::AudioUrl),
            video_url: optional(SongField::VideoUrl),
            notes: optional(SongField::Notes),
        })
    }

    /// Refresh the autocomplete suggestion from the known values of the active
    /// field's category.
    pub(crate) fn update_suggestion(&mut self, candidates: &[String]) {
        if self.active.category().is_none() {
            self.suggestion = None;
            return;
        }

        let current = self.value(self.active);
        if self.autocomplete_disabled || current.chars().count() < 2 {
            self.suggestion = None;
            return;
        }

        let current_lower = current.to_lowercase();
        self.suggestion = candidates
            .iter()
            .find(|candidate| candidate.to_lowercase().starts_with(&current_lower))
            .filter(|candidate| candidate.to_lowercase() != current_lower)
            .cloned();
    }

    /// Apply the suggested value, marking autocomplete as satisfied.
    pub(crate) fn accept_suggestion(&mut self) -> bool {
        if self.suggestion_suffix().is_none() {
            return false;
        }
        match self.suggestion.take() {
            Some(candidate) => {
                let field = self.active;
                *self.value_mut(field) = candidate;
                self.autocomplete_disabled = true;
                true
            }
            None => false,
        }
    }

    /// Disable autocomplete until the user types again.
    pub(crate) fn cancel_autocomplete(&mut self) -> bool {
        if self.suggestion.take().is_some() {
            self.autocomplete_disabled = true;
            return true;
        }
        false
    }

    /// The remaining characters to display as a ghosted hint.
    pub(crate) fn suggestion_suffix(&self) -> Option<String> {
        let candidate = self.suggestion.as_ref()?;
        let current_len = self.value(self.active).chars().count();
        let suffix: String = candidate.chars().skip(current_len).collect();
        if suffix.is_empty() {
            None
        } else {
            Some(suffix)
        }
    }

    /// Render a styled line for the modal form, appending the autocomplete
    /// suffix on the active field.
    pub(crate) fn build_line(&self, field: SongField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = if !value.is_empty() {
            value.to_string()
        } else if field == SongField::Title {
            "<আবশ্যক>".to_string()
        } else {
            "<ঐচ্ছিক>".to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ];
        if is_active && !value.is_empty() {
            if let Some(suffix) = self.suggestion_suffix() {
                spans.push(Span::styled(suffix, Style::default().fg(Color::DarkGray)));
            }
        }

        Line::from(spans)
    }

    /// Display width of the label prefix plus the active value, for cursor
    /// placement.
    pub(crate) fn cursor_offset(&self) -> u16 {
        let typed = format!("{}: {}", self.active.label(), self.value(self.active));
        Span::raw(typed).width() as u16
    }

    pub(crate) fn active_row(&self) -> u16 {
        self.active.index() as u16
    }
}

/// State for confirming permanent song deletion.
pub(crate) struct ConfirmSongDelete {
    pub(crate) song: Song,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_into(form: &mut SongForm, text: &str) {
        for ch in text.chars() {
            form.push_char(ch);
        }
    }

    #[test]
    fn title_is_required() {
        let form = SongForm::default();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn parses_optional_fields_and_year() {
        let mut form = SongForm::default();
        type_into(&mut form, "  আমি বাংলায় গান গাই ");
        form.next_field();
        type_into(&mut form, "প্রতুল মুখোপাধ্যায়");
        while form.active != SongField::Year {
            form.next_field();
        }
        type_into(&mut form, "১৯৯২");

        let song = form.parse_inputs().unwrap();
        assert_eq!(song.title, "আমি বাংলায় গান গাই");
        assert_eq!(song.artist.as_deref(), Some("প্রতুল মুখোপাধ্যায়"));
        assert_eq!(song.release_year, Some(1992));
        assert_eq!(song.album, None);
    }

    #[test]
    fn rejects_non_positive_year() {
        let mut form = SongForm::default();
        type_into(&mut form, "গান");
        form.previous_field();
        form.previous_field();
        form.previous_field();
        form.previous_field();
        form.previous_field();
        assert_eq!(form.active, SongField::Year);
        type_into(&mut form, "0");
        assert!(form.parse_inputs().is_err());

        form.backspace();
        type_into(&mut form, "abc");
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn suggests_known_values_for_category_fields() {
        let artists = vec!["মান্না দে".to_string(), "মাহমুদুন্নবী".to_string()];
        let mut form = SongForm::default();
        form.next_field();
        type_into(&mut form, "মান");
        form.update_suggestion(&artists);
        assert_eq!(form.suggestion.as_deref(), Some("মান্না দে"));

        assert!(form.accept_suggestion());
        assert_eq!(form.value(SongField::Artist), "মান্না দে");
        assert!(form.autocomplete_disabled);

        form.update_suggestion(&artists);
        assert_eq!(form.suggestion, None);
    }

    #[test]
    fn no_suggestions_outside_category_fields() {
        let mut form = SongForm::default();
        type_into(&mut form, "মান্না");
        form.update_suggestion(&["মান্না দে".to_string()]);
        assert_eq!(form.suggestion, None);
        assert!(!form.cancel_autocomplete());
    }
}
