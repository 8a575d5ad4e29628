use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use crate::models::NewSong;

use super::songs::insert_songs;

struct Seed {
    title: &'static str,
    artist: &'static str,
    genre: &'static str,
    album: Option<&'static str>,
    lyricist: Option<&'static str>,
    composer: Option<&'static str>,
    release_year: Option<i32>,
    lyrics: Option<&'static str>,
}

const fn seed(title: &'static str, artist: &'static str, genre: &'static str) -> Seed {
    Seed {
        title,
        artist,
        genre,
        album: None,
        lyricist: None,
        composer: None,
        release_year: None,
        lyrics: None,
    }
}

const STARTER_CATALOG: &[Seed] = &[
    Seed {
        release_year: Some(1905),
        lyrics: Some("আমার সোনার বাংলা, আমি তোমায় ভালোবাসি..."),
        ..seed("আমার সোনার বাংলা", "বিভিন্ন শিল্পী", "দেশাত্মবোধক")
    },
    Seed {
        release_year: Some(1909),
        ..seed("ধনধান্য পুষ্পভরা", "দ্বিজেন্দ্রলাল রায়", "দেশাত্মবোধক")
    },
    Seed {
        album: Some("চলচ্চিত্র: ওরা ১১ জন"),
        release_year: Some(1972),
        ..seed(
            "এক সাগর রক্তের বিনিময়ে",
            "স্বপ্না রায় (মূল শিল্পী গোবিন্দ হালদার)",
            "দেশাত্মবোধক",
        )
    },
    Seed {
        release_year: Some(1971),
        ..seed("সালাম সালাম হাজার সালাম", "আব্দুল জব্বার", "দেশাত্মবোধক")
    },
    Seed {
        release_year: Some(1971),
        ..seed(
            "মোরা একটি ফুলকে বাঁচাবো বলে যুদ্ধ করি",
            "আপেল মাহমুদ",
            "দেশাত্মবোধক",
        )
    },
    seed("পুরানো সেই দিনের কথা", "রবীন্দ্রনাথ ঠাকুর", "রবীন্দ্রসঙ্গীত"),
    seed("যদি তোর ডাক শুনে কেউ না আসে", "রবীন্দ্রনাথ ঠাকুর", "রবীন্দ্রসঙ্গীত"),
    seed("কারার ঐ লৌহকপাট", "কাজী নজরুল ইসলাম", "নজরুলগীতি"),
    seed("চল্‌ চল্‌ চল্‌", "কাজী নজরুল ইসলাম", "নজরুলগীতি"),
    Seed {
        lyricist: Some("গৌরীপ্রসন্ন মজুমদার"),
        composer: Some("সুপর্ণকান্তি ঘোষ"),
        release_year: Some(1983),
        ..seed("কফি হাউসের সেই আড্ডাটা", "মান্না দে", "আধুনিক বাংলা")
    },
    Seed {
        album: Some("সপ্তপদী"),
        release_year: Some(1961),
        ..seed(
            "এই পথ যদি না শেষ হয়",
            "হেমন্ত মুখোপাধ্যায়, সন্ধ্যা মুখোপাধ্যায়",
            "সিনেমার গান",
        )
    },
    Seed {
        release_year: Some(1992),
        ..seed("আমি বাংলায় গান গাই", "প্রতুল মুখোপাধ্যায়", "জীবনমুখী")
    },
];

/// The songs a brand new catalog starts with.
pub fn starter_songs() -> Vec<NewSong> {
    STARTER_CATALOG
        .iter()
        .map(|s| NewSong {
            title: s.title.to_string(),
            artist: Some(s.artist.to_string()),
            genre: Some(s.genre.to_string()),
            album: s.album.map(str::to_string),
            lyricist: s.lyricist.map(str::to_string),
            composer: s.composer.map(str::to_string),
            release_year: s.release_year,
            lyrics: s.lyrics.map(str::to_string),
            ..NewSong::default()
        })
        .collect()
}

/// Populate a freshly created catalog.
pub fn seed_initial_songs(conn: &mut Connection) -> Result<usize> {
    let inserted = insert_songs(conn, starter_songs())?;
    info!("Seeded catalog with {} starter songs", inserted);
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{count_distinct, count_songs, open_in_memory};
    use crate::models::Category;

    #[test]
    fn seeds_the_starter_catalog() {
        let mut conn = open_in_memory().unwrap().conn;
        assert_eq!(seed_initial_songs(&mut conn).unwrap(), 12);
        assert_eq!(count_songs(&conn).unwrap(), 12);
        assert_eq!(count_distinct(&conn, Category::Genre).unwrap(), 6);
        assert_eq!(count_distinct(&conn, Category::Lyricist).unwrap(), 1);
        assert_eq!(count_distinct(&conn, Category::Era).unwrap(), 0);
    }
}
