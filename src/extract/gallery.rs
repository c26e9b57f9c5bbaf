//! Home-page banners and the photo and video albums
//!
//! Banners are not laid out as a listing: every image served from the
//! `banner/ori/` folder is one banner, wherever the nested tables put it.
//! Albums are `.textli` rows with the album link in cell 1.

use super::document::{first_attr, first_text};
use super::heuristics::{link_param, parse_count};
use super::{extract_rows, Extraction, ParsedDocument, Row, RowRules, SkipReason};

pub const BANNERS_PATH: &str = "/banner_list.php";

/// `type=1` lists the home-page slider
pub const BANNER_QUERY: &[(&str, &str)] = &[("type", "1")];

/// Each matching image is its own row; there are no cells to screen
pub const BANNER_RULES: RowRules = RowRules {
    row_selector: r#"img[src^="banner/ori/"]"#,
    min_columns: 0,
    header_cell: 0,
    header_tokens: &[],
};

pub const PHOTOS_PATH: &str = "/photo_list.php";

pub const PHOTO_RULES: RowRules = RowRules {
    row_selector: ".textli",
    min_columns: 3,
    header_cell: 0,
    header_tokens: &["S.No"],
};

pub const VIDEOS_PATH: &str = "/video_list.php";

pub const VIDEO_RULES: RowRules = PHOTO_RULES;

/// The photo listing shows the item count in cell 3, the video listing in cell 4
const PHOTO_COUNT_CELL: usize = 3;
const VIDEO_COUNT_CELL: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub name: String,
    /// Link to the album page, e.g. `photo.php?pid=12`
    pub url: Option<String>,
    pub album_id: Option<String>,
    pub item_count: Option<i64>,
}

pub fn extract_banners(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<Banner>> {
    extract_rows(doc, rules, read_banner)
}

pub fn extract_photo_albums(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<Album>> {
    extract_rows(doc, rules, |doc, row| read_album(doc, row, PHOTO_COUNT_CELL))
}

pub fn extract_video_albums(doc: &ParsedDocument, rules: &RowRules) -> Vec<Extraction<Album>> {
    extract_rows(doc, rules, |doc, row| read_album(doc, row, VIDEO_COUNT_CELL))
}

fn read_banner(_: &ParsedDocument, row: &Row<'_>) -> Extraction<Banner> {
    match row.element().value().attr("src").map(str::trim) {
        Some(src) if !src.is_empty() => Extraction::Found(Banner {
            image_url: src.to_string(),
        }),
        _ => Extraction::Skipped(SkipReason::MissingKey),
    }
}

fn read_album(_: &ParsedDocument, row: &Row<'_>, count_cell: usize) -> Extraction<Album> {
    let Some(cell) = row.cell(1) else {
        return Extraction::Skipped(SkipReason::MissingKey);
    };
    let Some(name) = first_text(cell, "a") else {
        return Extraction::Skipped(SkipReason::MissingKey);
    };
    let url = first_attr(cell, "a", "href");

    Extraction::Found(Album {
        name,
        album_id: url.as_deref().and_then(|href| link_param(href, "pid")),
        url,
        item_count: parse_count(&row.text(count_cell)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::found;

    #[test]
    fn test_banners_found_anywhere_in_layout() {
        let doc = ParsedDocument::parse(
            r#"<table><tr><td>
                <table><tr><td><img src="banner/ori/slide1.jpg"></td></tr></table>
                <img src="banner/thumb/slide1.jpg">
                <div><img src="banner/ori/slide2.jpg"></div>
                <img src="images/logo.png">
            </td></tr></table>"#,
        );
        let banners = found(extract_banners(&doc, &BANNER_RULES));

        let urls: Vec<&str> = banners.iter().map(|b| b.image_url.as_str()).collect();
        assert_eq!(urls, vec!["banner/ori/slide1.jpg", "banner/ori/slide2.jpg"]);
    }

    #[test]
    fn test_photo_albums() {
        let doc = ParsedDocument::parse(
            r#"<table>
                <tr class="textli"><td>S.No</td><td>Album</td><td>Link</td><td>Photos</td><td>Action</td></tr>
                <tr class="textli"><td>1</td><td><a href="photo.php?pid=12">Annual Function</a></td><td>View</td><td>24</td><td>Edit</td></tr>
                <tr class="textli"><td>2</td><td>No link here</td><td>View</td><td>3</td><td>Edit</td></tr>
            </table>"#,
        );
        let out = extract_photo_albums(&doc, &PHOTO_RULES);
        assert!(out.contains(&Extraction::Skipped(SkipReason::MissingKey)));

        let albums = found(out);
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].name, "Annual Function");
        assert_eq!(albums[0].url.as_deref(), Some("photo.php?pid=12"));
        assert_eq!(albums[0].album_id.as_deref(), Some("12"));
        assert_eq!(albums[0].item_count, Some(24));
    }

    #[test]
    fn test_video_albums_count_in_fifth_cell() {
        let doc = ParsedDocument::parse(
            r#"<table>
                <tr class="textli"><td>1</td><td><a href="video_panel.php?pid=7">Convocation</a></td><td>View</td><td>Link</td><td>5</td></tr>
                <tr class="textli"><td>2</td><td><a href="video_panel.php?pid=8">Seminar</a></td><td>View</td></tr>
            </table>"#,
        );
        let albums = found(extract_video_albums(&doc, &VIDEO_RULES));

        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].album_id.as_deref(), Some("7"));
        assert_eq!(albums[0].item_count, Some(5));
        assert_eq!(albums[1].item_count, None);
    }
}
