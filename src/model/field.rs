//! Text field definitions and the ordered field collection.
//!
//! A [`TextField`] is pure data: where to draw, what column to read, and how
//! to style it. Fields carry stable integer ids that survive deletion of their
//! neighbours, so a caller can keep referring to "field 3" after field 1 is gone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ============================================================================
// FIELD TYPE
// ============================================================================

/// Semantic type of a field.
///
/// Only affects sample text and column suggestions. Rendering treats every
/// type identically, except that `Name` fields feed the output file label and
/// the `{Name}` email placeholder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Name,
    RollNumber,
    Branch,
    Course,
    Date,
    Grade,
    Score,
    Department,
    Year,
    Email,
    Custom,
}

impl FieldType {
    pub const ALL: [FieldType; 11] = [
        FieldType::Name,
        FieldType::RollNumber,
        FieldType::Branch,
        FieldType::Course,
        FieldType::Date,
        FieldType::Grade,
        FieldType::Score,
        FieldType::Department,
        FieldType::Year,
        FieldType::Email,
        FieldType::Custom,
    ];

    /// Human-readable label (e.g. "Roll Number").
    pub fn label(self) -> &'static str {
        match self {
            FieldType::Name => "Name",
            FieldType::RollNumber => "Roll Number",
            FieldType::Branch => "Branch",
            FieldType::Course => "Course",
            FieldType::Date => "Date",
            FieldType::Grade => "Grade",
            FieldType::Score => "Score",
            FieldType::Department => "Department",
            FieldType::Year => "Year",
            FieldType::Email => "Email",
            FieldType::Custom => "Custom",
        }
    }

    /// Placeholder text shown before real data is bound.
    pub fn sample_text(self) -> &'static str {
        match self {
            FieldType::Name => "JOHN DOE",
            FieldType::RollNumber => "2023001",
            FieldType::Branch => "COMPUTER SCIENCE",
            FieldType::Course => "B.TECH",
            FieldType::Date => "2024-01-15",
            FieldType::Grade => "A+",
            FieldType::Score => "95%",
            FieldType::Department => "CSE",
            FieldType::Year => "2024",
            FieldType::Email => "john.doe@example.com",
            FieldType::Custom => "SAMPLE TEXT",
        }
    }

    /// Column-name fragments that usually hold this type's data, best first.
    fn column_candidates(self) -> &'static [&'static str] {
        match self {
            FieldType::Name => &[
                "name",
                "full_name",
                "participant_name",
                "student_name",
                "full name",
                "participant full name",
            ],
            FieldType::RollNumber => &[
                "roll_number",
                "roll_no",
                "student_id",
                "id",
                "roll number",
                "roll no",
            ],
            FieldType::Branch => &["branch", "department", "stream", "course"],
            FieldType::Course => &["course", "program", "degree"],
            FieldType::Date => &["date", "issue_date", "completion_date", "issue date"],
            FieldType::Grade => &["grade", "result", "class"],
            FieldType::Score => &["score", "marks", "percentage", "points"],
            FieldType::Department => &["department", "dept", "branch"],
            FieldType::Year => &["year", "academic_year", "batch", "academic year"],
            FieldType::Email => &["email", "email_address", "mail", "e-mail", "email address"],
            FieldType::Custom => &[],
        }
    }

    /// Pick the first column whose name contains one of this type's candidates.
    ///
    /// Candidates are tried in priority order, so for `Name` a column called
    /// `Participant Name` wins over `Full_Name` only if no earlier candidate matches.
    pub fn suggest_column<'a>(self, columns: &'a [String]) -> Option<&'a str> {
        self.column_candidates().iter().find_map(|candidate| {
            columns
                .iter()
                .find(|column| column.to_lowercase().contains(candidate))
                .map(String::as_str)
        })
    }
}

/// Pick the column most likely to hold email addresses.
pub fn suggest_email_column(columns: &[String]) -> Option<&str> {
    columns
        .iter()
        .find(|c| {
            let lower = c.to_lowercase();
            lower.contains("email") || lower.contains("mail")
        })
        .map(String::as_str)
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FieldType {
    type Err = String;

    /// Accepts labels and snake_case ("Roll Number", "roll_number", "rollnumber").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        FieldType::ALL
            .into_iter()
            .find(|t| t.label().replace(' ', "").to_lowercase() == key)
            .ok_or_else(|| format!("unknown field type '{}'", s))
    }
}

impl TryFrom<String> for FieldType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.label().replace(' ', "_").to_lowercase()
    }
}

// ============================================================================
// COLOR & POSITION
// ============================================================================

/// 8-bit RGB color, written as `#RRGGBB` in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
    /// Conventional hyperlink blue, used for link subtexts and verification text.
    pub const LINK: Rgb = Rgb([0x00, 0x00, 0xEE]);
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("invalid color '{}', expected #RRGGBB", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("invalid color '{}', expected #RRGGBB", s))
        };
        Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// A pixel position in template image space (top-left origin), written as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
}

impl Anchor {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[i32; 2]> for Anchor {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Anchor> for [i32; 2] {
    fn from(a: Anchor) -> Self {
        [a.x, a.y]
    }
}

// ============================================================================
// TEXT FIELD
// ============================================================================

fn default_font_size() -> u32 {
    50
}

/// One configured piece of per-row text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextField {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub field_type: FieldType,
    /// Data column the text is read from.
    #[serde(default)]
    pub data_column: String,
    /// Font file. `None` uses the built-in default face.
    #[serde(default)]
    pub font: Option<PathBuf>,
    /// Em size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default)]
    pub color: Rgb,
    /// Center of the rendered text. `None` means the field has not been placed yet.
    #[serde(default)]
    pub anchor: Option<Anchor>,
    /// Static link target; makes the rendered text clickable in the PDF.
    #[serde(default)]
    pub link_url: Option<String>,
}

impl TextField {
    /// A new unplaced, unbound field with editor defaults.
    pub fn new(id: u32, field_type: FieldType) -> Self {
        Self {
            id,
            field_type,
            data_column: String::new(),
            font: None,
            font_size: default_font_size(),
            color: Rgb::BLACK,
            anchor: None,
            link_url: None,
        }
    }

    pub fn is_placed(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn is_bound(&self) -> bool {
        !self.data_column.trim().is_empty()
    }

    /// Link target, ignoring blank URLs.
    pub fn link(&self) -> Option<&str> {
        self.link_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Size of the visible link affordance drawn under the field: 60% of the
    /// field size, never below 12px.
    pub fn link_subtext_size(&self) -> u32 {
        ((self.font_size as f32 * 0.6) as u32).max(12)
    }
}

// ============================================================================
// FIELD SET
// ============================================================================

/// Ordered field collection with a stable id allocator.
///
/// Ids are handed out monotonically and not reused after `remove` or `clear`
/// until the counter runs out at `u32::MAX`; from then on the lowest free id
/// is taken. Render order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TextField>", into = "Vec<TextField>")]
pub struct FieldSet {
    fields: Vec<TextField>,
    next_id: u32,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new field of `field_type` with editor defaults and return it.
    pub fn add(&mut self, field_type: FieldType) -> &mut TextField {
        let id = self.allocate_id();
        self.fields.push(TextField::new(id, field_type));
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }

    /// Append a prepared field, replacing its id with a freshly allocated one.
    pub fn push(&mut self, mut field: TextField) -> u32 {
        field.id = self.allocate_id();
        let id = field.id;
        self.fields.push(field);
        id
    }

    pub fn remove(&mut self, id: u32) -> Option<TextField> {
        let pos = self.fields.iter().position(|f| f.id == id)?;
        Some(self.fields.remove(pos))
    }

    /// Remove every field. The id allocator keeps counting.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn get(&self, id: u32) -> Option<&TextField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut TextField> {
        self.fields.iter_mut().find(|f| f.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TextField> {
        self.fields.iter()
    }

    pub fn as_slice(&self) -> &[TextField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn allocate_id(&mut self) -> u32 {
        match self.next_id.checked_add(1) {
            Some(next) => {
                let id = self.next_id;
                self.next_id = next;
                id
            }
            None => (0..u32::MAX)
                .find(|id| self.get(*id).is_none())
                .unwrap_or(u32::MAX),
        }
    }
}

impl TryFrom<Vec<TextField>> for FieldSet {
    type Error = String;

    /// Keeps the ids found in `fields`; a repeated id is replaced by a fresh one
    /// so identity stays unique. `u32::MAX` is reserved and rejected.
    fn try_from(fields: Vec<TextField>) -> Result<Self, Self::Error> {
        let mut next_id = 0u32;
        for field in &fields {
            next_id = next_id.max(
                field
                    .id
                    .checked_add(1)
                    .ok_or_else(|| format!("field id {} is out of range", field.id))?,
            );
        }
        let mut set = FieldSet {
            fields: Vec::with_capacity(fields.len()),
            next_id,
        };
        for field in fields {
            if set.get(field.id).is_some() {
                set.push(field);
            } else {
                set.fields.push(field);
            }
        }
        Ok(set)
    }
}

impl From<FieldSet> for Vec<TextField> {
    fn from(set: FieldSet) -> Self {
        set.fields
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a TextField;
    type IntoIter = std::slice::Iter<'a, TextField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut set = FieldSet::new();
        let a = set.add(FieldType::Name).id;
        let b = set.add(FieldType::Date).id;
        let c = set.add(FieldType::Grade).id;
        assert_eq!((a, b, c), (0, 1, 2));

        set.remove(b);
        let d = set.add(FieldType::Course).id;
        assert_eq!(d, 3);

        let ids: Vec<u32> = set.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0, 2, 3]);

        set.clear();
        assert_eq!(set.add(FieldType::Name).id, 4);
    }

    #[test]
    fn test_from_vec_keeps_ids_and_fixes_duplicates() {
        let set = FieldSet::try_from(vec![
            TextField::new(5, FieldType::Name),
            TextField::new(2, FieldType::Date),
            TextField::new(5, FieldType::Grade),
        ])
        .unwrap();
        let ids: Vec<u32> = set.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![5, 2, 6]);
    }

    #[test]
    fn test_largest_id_is_rejected() {
        let err = FieldSet::try_from(vec![
            TextField::new(1, FieldType::Name),
            TextField::new(u32::MAX, FieldType::Date),
        ])
        .unwrap_err();
        assert_eq!(err, "field id 4294967295 is out of range");

        let set = FieldSet::try_from(vec![TextField::new(u32::MAX - 1, FieldType::Name)]).unwrap();
        assert_eq!(set.get(u32::MAX - 1).map(|f| f.field_type), Some(FieldType::Name));
    }

    #[test]
    fn test_exhausted_counter_takes_lowest_free_id() {
        let mut set = FieldSet::try_from(vec![
            TextField::new(0, FieldType::Name),
            TextField::new(u32::MAX - 1, FieldType::Date),
        ])
        .unwrap();
        assert_eq!(set.add(FieldType::Grade).id, 1);
        assert_eq!(set.add(FieldType::Grade).id, 2);
        set.remove(0);
        assert_eq!(set.add(FieldType::Course).id, 0);
    }

    #[test]
    fn test_field_type_parsing() {
        assert_eq!("Roll Number".parse::<FieldType>(), Ok(FieldType::RollNumber));
        assert_eq!("roll_number".parse::<FieldType>(), Ok(FieldType::RollNumber));
        assert_eq!("NAME".parse::<FieldType>(), Ok(FieldType::Name));
        assert!("nickname".parse::<FieldType>().is_err());
        assert_eq!(String::from(FieldType::RollNumber), "roll_number");
    }

    #[test]
    fn test_sample_text() {
        assert_eq!(FieldType::Name.sample_text(), "JOHN DOE");
        assert_eq!(FieldType::Custom.sample_text(), "SAMPLE TEXT");
    }

    #[test]
    fn test_suggest_column() {
        let cols = columns(&["Student ID", "Participant Full Name", "E-Mail", "Marks"]);
        assert_eq!(FieldType::Name.suggest_column(&cols), Some("Participant Full Name"));
        assert_eq!(FieldType::RollNumber.suggest_column(&cols), Some("Student ID"));
        assert_eq!(FieldType::Score.suggest_column(&cols), Some("Marks"));
        assert_eq!(FieldType::Email.suggest_column(&cols), Some("E-Mail"));
        assert_eq!(FieldType::Custom.suggest_column(&cols), None);
        assert_eq!(suggest_email_column(&cols), Some("E-Mail"));
    }

    #[test]
    fn test_rgb_roundtrip() {
        let c: Rgb = "#1A2b3C".parse().unwrap();
        assert_eq!(c, Rgb([0x1a, 0x2b, 0x3c]));
        assert_eq!(c.to_string(), "#1a2b3c");
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_field_json() {
        let json = r##"{
            "id": 3,
            "field_type": "Roll Number",
            "data_column": "Roll",
            "font_size": 32,
            "color": "#ff0000",
            "anchor": [120, 45],
            "link_url": "https://example.com"
        }"##;
        let field: TextField = serde_json::from_str(json).unwrap();
        assert_eq!(field.field_type, FieldType::RollNumber);
        assert_eq!(field.anchor, Some(Anchor::new(120, 45)));
        assert_eq!(field.color, Rgb([255, 0, 0]));
        assert_eq!(field.link(), Some("https://example.com"));
        assert!(field.font.is_none());
    }

    #[test]
    fn test_link_subtext_size() {
        let mut field = TextField::new(0, FieldType::Name);
        field.font_size = 50;
        assert_eq!(field.link_subtext_size(), 30);
        field.font_size = 10;
        assert_eq!(field.link_subtext_size(), 12);
    }

    #[test]
    fn test_blank_link_is_no_link() {
        let mut field = TextField::new(0, FieldType::Name);
        field.link_url = Some("   ".to_string());
        assert_eq!(field.link(), None);
    }
}
