//! The catalogue of resources the source system exposes
//!
//! Each [`ResourceKind`] names one listing page, its row rules, its paging
//! behaviour and its extraction policy. The policies deliberately stay
//! separate per resource; see the modules under [`crate::extract`].

use crate::config::ResourceOverride;
use crate::extract::admit_cards::{self, AdmitCard};
use crate::extract::branches::{self, Branch};
use crate::extract::cms::{self, Notice, WebPage};
use crate::extract::courses::{self, Course};
use crate::extract::fees::{self, DueEntry, FeeReceipt};
use crate::extract::gallery::{self, Album, Banner};
use crate::extract::marksheets::{self, Marksheet};
use crate::extract::materials::{self, StudyMaterial};
use crate::extract::paper_sets::{self, PaperSet};
use crate::extract::results::{self, ExamResult};
use crate::extract::staff::{self, StaffMember};
use crate::extract::students::{self, Student};
use crate::extract::wallet::{self, WalletEntry};
use crate::extract::{Confidence, Extraction, ParsedDocument, RowRules};
use crate::ConfigError;
use std::fmt;
use std::str::FromStr;

const NO_QUERY: &[(&str, &str)] = &[];

/// A category of scraped data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Students,
    Marksheets,
    AdmitCards,
    OnlineResults,
    FeeReports,
    BranchWallet,
    Dues,
    PaperSets,
    StudyMaterials,
    Staff,
    Courses,
    Branches,
    News,
    WebPages,
    Banners,
    PhotoAlbums,
    VideoAlbums,
}

impl ResourceKind {
    /// Every resource, in the order a full sync visits them
    pub const ALL: [ResourceKind; 17] = [
        ResourceKind::Courses,
        ResourceKind::Branches,
        ResourceKind::Staff,
        ResourceKind::Students,
        ResourceKind::Marksheets,
        ResourceKind::AdmitCards,
        ResourceKind::OnlineResults,
        ResourceKind::FeeReports,
        ResourceKind::BranchWallet,
        ResourceKind::Dues,
        ResourceKind::PaperSets,
        ResourceKind::StudyMaterials,
        ResourceKind::News,
        ResourceKind::WebPages,
        ResourceKind::Banners,
        ResourceKind::PhotoAlbums,
        ResourceKind::VideoAlbums,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Students => "students",
            ResourceKind::Marksheets => "marksheets",
            ResourceKind::AdmitCards => "admit-cards",
            ResourceKind::OnlineResults => "online-results",
            ResourceKind::FeeReports => "fee-reports",
            ResourceKind::BranchWallet => "branch-wallet",
            ResourceKind::Dues => "dues",
            ResourceKind::PaperSets => "paper-sets",
            ResourceKind::StudyMaterials => "study-materials",
            ResourceKind::Staff => "staff",
            ResourceKind::Courses => "courses",
            ResourceKind::Branches => "branches",
            ResourceKind::News => "news",
            ResourceKind::WebPages => "web-pages",
            ResourceKind::Banners => "banners",
            ResourceKind::PhotoAlbums => "photo-albums",
            ResourceKind::VideoAlbums => "video-albums",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ConfigError::UnknownResource(name.to_string()))
    }

    /// Target table in the store
    pub fn table(&self) -> &'static str {
        match self {
            ResourceKind::Students => "students",
            ResourceKind::Marksheets => "marksheets",
            ResourceKind::AdmitCards => "admit_cards",
            ResourceKind::OnlineResults => "online_results",
            ResourceKind::FeeReports => "fee_reports",
            ResourceKind::BranchWallet => "branch_wallet",
            ResourceKind::Dues => "dues",
            ResourceKind::PaperSets => "paper_sets",
            ResourceKind::StudyMaterials => "study_materials",
            ResourceKind::Staff => "staff",
            ResourceKind::Courses => "courses",
            ResourceKind::Branches => "branches",
            ResourceKind::News => "notices",
            ResourceKind::WebPages => "web_pages",
            ResourceKind::Banners => "banners",
            ResourceKind::PhotoAlbums => "photo_albums",
            ResourceKind::VideoAlbums => "video_albums",
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.default_paging().is_some()
    }

    fn default_paging(&self) -> Option<Paging> {
        match self {
            ResourceKind::Students => Some(Paging::new(50, 1000)),
            ResourceKind::Marksheets => Some(Paging::new(50, 2500)),
            ResourceKind::PaperSets => Some(Paging::new(10, 500)),
            _ => None,
        }
    }

    fn source(&self) -> (&'static str, &'static [(&'static str, &'static str)], RowRules) {
        match self {
            ResourceKind::Students => (students::PATH, NO_QUERY, students::RULES),
            ResourceKind::Marksheets => (marksheets::PATH, NO_QUERY, marksheets::RULES),
            ResourceKind::AdmitCards => (admit_cards::PATH, NO_QUERY, admit_cards::RULES),
            ResourceKind::OnlineResults => (results::PATH, NO_QUERY, results::RULES),
            ResourceKind::FeeReports => (fees::RECEIPTS_PATH, NO_QUERY, fees::RECEIPT_RULES),
            ResourceKind::BranchWallet => (wallet::PATH, NO_QUERY, wallet::RULES),
            ResourceKind::Dues => (fees::DUES_PATH, NO_QUERY, fees::DUE_RULES),
            ResourceKind::PaperSets => (paper_sets::PATH, NO_QUERY, paper_sets::RULES),
            ResourceKind::StudyMaterials => (materials::PATH, NO_QUERY, materials::RULES),
            ResourceKind::Staff => (staff::PATH, NO_QUERY, staff::RULES),
            ResourceKind::Courses => (courses::PATH, NO_QUERY, courses::RULES),
            ResourceKind::Branches => (branches::PATH, NO_QUERY, branches::RULES),
            ResourceKind::News => (cms::NEWS_PATH, cms::COUNTRY_QUERY, cms::NEWS_RULES),
            ResourceKind::WebPages => (cms::PAGES_PATH, cms::COUNTRY_QUERY, cms::PAGE_RULES),
            ResourceKind::Banners => (
                gallery::BANNERS_PATH,
                gallery::BANNER_QUERY,
                gallery::BANNER_RULES,
            ),
            ResourceKind::PhotoAlbums => (
                gallery::PHOTOS_PATH,
                cms::COUNTRY_QUERY,
                gallery::PHOTO_RULES,
            ),
            ResourceKind::VideoAlbums => (
                gallery::VIDEOS_PATH,
                cms::COUNTRY_QUERY,
                gallery::VIDEO_RULES,
            ),
        }
    }

    /// The built-in descriptor for this resource
    pub fn descriptor(&self) -> ResourceDescriptor {
        let (path, query, rules) = self.source();
        ResourceDescriptor {
            kind: *self,
            path,
            query,
            rules,
            paging: self.default_paging(),
        }
    }

    /// The descriptor with any configured paging override applied
    pub fn descriptor_with(&self, overrides: Option<&ResourceOverride>) -> ResourceDescriptor {
        let mut descriptor = self.descriptor();
        if let (Some(paging), Some(entry)) = (descriptor.paging.as_mut(), overrides) {
            if let Some(size) = entry.page_size {
                paging.page_size = size;
            }
            if let Some(cap) = entry.max_offset {
                paging.max_offset = cap;
            }
        }
        descriptor
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// How a paginated listing is walked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page_size: u32,
    /// Pagination stops once the next offset would exceed this
    pub max_offset: u32,
}

impl Paging {
    pub fn new(page_size: u32, max_offset: u32) -> Self {
        Self {
            page_size,
            max_offset,
        }
    }
}

/// Static description of one resource, fixed for the life of a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub path: &'static str,
    /// Query pairs sent with every request, before any paging pairs
    pub query: &'static [(&'static str, &'static str)],
    pub rules: RowRules,
    /// `None` for listings served as a single page
    pub paging: Option<Paging>,
}

impl ResourceDescriptor {
    pub fn min_columns(&self) -> usize {
        self.rules.min_columns
    }

    pub fn base_query(&self) -> Vec<(String, String)> {
        self.query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Runs this resource's extraction policy over a fetched page
    pub fn extract(&self, doc: &ParsedDocument) -> Vec<Extraction<Record>> {
        let rules = &self.rules;
        match self.kind {
            ResourceKind::Students => lift(students::extract(doc, rules), Record::Student),
            ResourceKind::Marksheets => lift(marksheets::extract(doc, rules), Record::Marksheet),
            ResourceKind::AdmitCards => lift(admit_cards::extract(doc, rules), Record::AdmitCard),
            ResourceKind::OnlineResults => lift(results::extract(doc, rules), Record::ExamResult),
            ResourceKind::FeeReports => {
                lift(fees::extract_receipts(doc, rules), Record::FeeReceipt)
            }
            ResourceKind::BranchWallet => lift(wallet::extract(doc, rules), Record::WalletEntry),
            ResourceKind::Dues => lift(fees::extract_dues(doc, rules), Record::Due),
            ResourceKind::PaperSets => lift(paper_sets::extract(doc, rules), Record::PaperSet),
            ResourceKind::StudyMaterials => {
                lift(materials::extract(doc, rules), Record::StudyMaterial)
            }
            ResourceKind::Staff => lift(staff::extract(doc, rules), Record::Staff),
            ResourceKind::Courses => lift(courses::extract(doc, rules), Record::Course),
            ResourceKind::Branches => lift(branches::extract(doc, rules), Record::Branch),
            ResourceKind::News => lift(cms::extract_news(doc, rules), Record::Notice),
            ResourceKind::WebPages => lift(cms::extract_pages(doc, rules), Record::WebPage),
            ResourceKind::Banners => lift(gallery::extract_banners(doc, rules), Record::Banner),
            ResourceKind::PhotoAlbums => {
                lift(gallery::extract_photo_albums(doc, rules), Record::PhotoAlbum)
            }
            ResourceKind::VideoAlbums => {
                lift(gallery::extract_video_albums(doc, rules), Record::VideoAlbum)
            }
        }
    }
}

fn lift<T>(extractions: Vec<Extraction<T>>, wrap: fn(T) -> Record) -> Vec<Extraction<Record>> {
    extractions.into_iter().map(|e| e.map(wrap)).collect()
}

/// A scraped record of any resource
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Student(Student),
    Marksheet(Marksheet),
    AdmitCard(AdmitCard),
    ExamResult(ExamResult),
    FeeReceipt(FeeReceipt),
    WalletEntry(WalletEntry),
    Due(DueEntry),
    PaperSet(PaperSet),
    StudyMaterial(StudyMaterial),
    Staff(StaffMember),
    Course(Course),
    Branch(Branch),
    Notice(Notice),
    WebPage(WebPage),
    Banner(Banner),
    PhotoAlbum(Album),
    VideoAlbum(Album),
}

impl Record {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Record::Student(_) => ResourceKind::Students,
            Record::Marksheet(_) => ResourceKind::Marksheets,
            Record::AdmitCard(_) => ResourceKind::AdmitCards,
            Record::ExamResult(_) => ResourceKind::OnlineResults,
            Record::FeeReceipt(_) => ResourceKind::FeeReports,
            Record::WalletEntry(_) => ResourceKind::BranchWallet,
            Record::Due(_) => ResourceKind::Dues,
            Record::PaperSet(_) => ResourceKind::PaperSets,
            Record::StudyMaterial(_) => ResourceKind::StudyMaterials,
            Record::Staff(_) => ResourceKind::Staff,
            Record::Course(_) => ResourceKind::Courses,
            Record::Branch(_) => ResourceKind::Branches,
            Record::Notice(_) => ResourceKind::News,
            Record::WebPage(_) => ResourceKind::WebPages,
            Record::Banner(_) => ResourceKind::Banners,
            Record::PhotoAlbum(_) => ResourceKind::PhotoAlbums,
            Record::VideoAlbum(_) => ResourceKind::VideoAlbums,
        }
    }

    /// The identifier the store upserts on
    pub fn natural_key(&self) -> String {
        match self {
            Record::Student(s) => s.reg_no.clone(),
            Record::Marksheet(m) => m.reg_no.clone(),
            Record::AdmitCard(a) => a.reg_no.clone(),
            Record::ExamResult(r) => r.result_key(),
            Record::FeeReceipt(f) => f.entry_key(),
            Record::WalletEntry(w) => w.entry_key(),
            Record::Due(d) => d.sid.clone(),
            Record::PaperSet(p) => p.paper_key(),
            Record::StudyMaterial(m) => m.material_key(),
            Record::Staff(s) => s.emp_id.clone(),
            Record::Course(c) => c.name.clone(),
            Record::Branch(b) => b.code.clone(),
            Record::Notice(n) => n.title.clone(),
            Record::WebPage(w) => w.title.clone(),
            Record::Banner(b) => b.image_url.clone(),
            Record::PhotoAlbum(a) | Record::VideoAlbum(a) => a.name.clone(),
        }
    }

    /// True for a student whose password was only guessed
    pub fn has_low_confidence(&self) -> bool {
        matches!(
            self,
            Record::Student(Student {
                password: Some(token),
                ..
            }) if token.confidence == Confidence::Low
        )
    }
}
