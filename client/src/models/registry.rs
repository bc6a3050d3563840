//! Per-kind field registry.
//!
//! One static [`EntitySchema`] per [`EntityKind`]: remote paths, natural key,
//! field aliases, searchable and required fields, the import header mapping
//! table and the default export columns.

use super::{ColumnSpec, EntityKind};

/// Value format checked during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    Email,
    /// `YYYY-MM-DD`
    Date,
    /// `HH:MM` (24h)
    Time,
}

/// A canonical field and the alternative names it appears under.
#[derive(Debug)]
pub struct FieldDef {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub format: Option<FieldFormat>,
}

impl FieldDef {
    /// Canonical name first, then aliases in priority order.
    pub fn candidates(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

/// Everything the data layer needs to know about one entity kind.
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub list_path: &'static str,
    pub create_path: &'static str,
    pub key_field: &'static str,
    /// Prefix for export file names.
    pub file_prefix: &'static str,
    pub fields: &'static [FieldDef],
    pub searchable: &'static [&'static str],
    pub required: &'static [&'static str],
    /// Lower-cased, trimmed source header to canonical field.
    pub header_map: &'static [(&'static str, &'static str)],
    /// Default export columns as `(key, label)`.
    pub export_columns: &'static [(&'static str, &'static str)],
    /// Role tagged on import for account-backed kinds.
    pub default_role: Option<&'static str>,
    /// Whether imported rows need a username and temporary password.
    pub needs_credentials: bool,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Map an import header to its canonical field name. Lookup ignores case
    /// and surrounding whitespace; unknown headers pass through trimmed.
    pub fn canonical_header(&self, header: &str) -> String {
        let trimmed = header.trim();
        let key = trimmed.to_lowercase();
        self.header_map
            .iter()
            .find(|(from, _)| *from == key)
            .map(|(_, to)| (*to).to_string())
            .unwrap_or_else(|| trimmed.to_string())
    }

    pub fn default_columns(&self) -> Vec<ColumnSpec> {
        self.export_columns
            .iter()
            .map(|(key, label)| ColumnSpec::new(*key, *label))
            .collect()
    }
}

const fn field(name: &'static str, aliases: &'static [&'static str]) -> FieldDef {
    FieldDef {
        name,
        aliases,
        format: None,
    }
}

const fn formatted(
    name: &'static str,
    aliases: &'static [&'static str],
    format: FieldFormat,
) -> FieldDef {
    FieldDef {
        name,
        aliases,
        format: Some(format),
    }
}

pub fn schema(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Student => &STUDENT,
        EntityKind::Teacher => &TEACHER,
        EntityKind::Administrator => &ADMINISTRATOR,
        EntityKind::School => &SCHOOL,
        EntityKind::Subject => &SUBJECT,
        EntityKind::TimetableEntry => &TIMETABLE,
    }
}

// =============================================================================
// Students
// =============================================================================

static STUDENT: EntitySchema = EntitySchema {
    kind: EntityKind::Student,
    list_path: "students",
    create_path: "students",
    key_field: "admissionNumber",
    file_prefix: "students",
    fields: &[
        field("name", &["fullName", "studentName"]),
        field("firstName", &[]),
        field("lastName", &["surname"]),
        formatted("email", &["schoolEmail", "personalEmail"], FieldFormat::Email),
        field("admissionNumber", &["admissionNo"]),
        field("gender", &[]),
        formatted("dateOfBirth", &["dob"], FieldFormat::Date),
        field("grade", &["className", "class"]),
        field("schoolCode", &["school.code"]),
        field("guardianName", &["parentName"]),
        field("guardianPhone", &["parentPhone"]),
        formatted("enrollmentDate", &["admissionDate"], FieldFormat::Date),
    ],
    searchable: &["name", "firstName", "lastName", "email", "admissionNumber"],
    required: &["name", "email"],
    header_map: &[
        ("name", "name"),
        ("full name", "name"),
        ("student name", "name"),
        ("first name", "firstName"),
        ("firstname", "firstName"),
        ("last name", "lastName"),
        ("lastname", "lastName"),
        ("surname", "lastName"),
        ("email", "email"),
        ("email address", "email"),
        ("e-mail", "email"),
        ("school email", "email"),
        ("admission number", "admissionNumber"),
        ("admission no", "admissionNumber"),
        ("admission no.", "admissionNumber"),
        ("adm no", "admissionNumber"),
        ("gender", "gender"),
        ("sex", "gender"),
        ("date of birth", "dateOfBirth"),
        ("dob", "dateOfBirth"),
        ("birth date", "dateOfBirth"),
        ("grade", "grade"),
        ("class", "grade"),
        ("school code", "schoolCode"),
        ("school", "schoolCode"),
        ("guardian name", "guardianName"),
        ("parent name", "guardianName"),
        ("guardian phone", "guardianPhone"),
        ("parent phone", "guardianPhone"),
        ("enrollment date", "enrollmentDate"),
        ("admission date", "enrollmentDate"),
    ],
    export_columns: &[
        ("admissionNumber", "Admission Number"),
        ("name", "Name"),
        ("email", "Email"),
        ("gender", "Gender"),
        ("grade", "Grade"),
        ("dateOfBirth", "Date of Birth"),
        ("schoolCode", "School Code"),
        ("guardianName", "Guardian Name"),
        ("guardianPhone", "Guardian Phone"),
    ],
    default_role: None,
    needs_credentials: true,
};

// =============================================================================
// Teachers
// =============================================================================

static TEACHER: EntitySchema = EntitySchema {
    kind: EntityKind::Teacher,
    list_path: "teachers",
    create_path: "teachers",
    key_field: "teacherCode",
    file_prefix: "teachers",
    fields: &[
        field("name", &["fullName"]),
        formatted("email", &["schoolEmail", "personalEmail"], FieldFormat::Email),
        field("teacherCode", &["employeeNumber", "staffNumber"]),
        field("phone", &["phoneNumber"]),
        field("subjectSpecialization", &["specialization"]),
        field("schoolCode", &["school.code"]),
        formatted("hireDate", &["dateHired"], FieldFormat::Date),
        field("gender", &[]),
    ],
    searchable: &["name", "email", "teacherCode"],
    required: &["name", "email"],
    header_map: &[
        ("name", "name"),
        ("full name", "name"),
        ("teacher name", "name"),
        ("email", "email"),
        ("email address", "email"),
        ("e-mail", "email"),
        ("teacher code", "teacherCode"),
        ("staff number", "teacherCode"),
        ("employee number", "teacherCode"),
        ("tsc number", "teacherCode"),
        ("phone", "phone"),
        ("phone number", "phone"),
        ("mobile", "phone"),
        ("subject", "subjectSpecialization"),
        ("specialization", "subjectSpecialization"),
        ("subject specialization", "subjectSpecialization"),
        ("school code", "schoolCode"),
        ("school", "schoolCode"),
        ("hire date", "hireDate"),
        ("date hired", "hireDate"),
        ("employment date", "hireDate"),
        ("gender", "gender"),
    ],
    export_columns: &[
        ("teacherCode", "Teacher Code"),
        ("name", "Name"),
        ("email", "Email"),
        ("phone", "Phone"),
        ("subjectSpecialization", "Specialization"),
        ("schoolCode", "School Code"),
        ("hireDate", "Hire Date"),
    ],
    default_role: Some("TEACHER"),
    needs_credentials: true,
};

// =============================================================================
// Administrators
// =============================================================================

static ADMINISTRATOR: EntitySchema = EntitySchema {
    kind: EntityKind::Administrator,
    list_path: "admins",
    create_path: "admins",
    key_field: "email",
    file_prefix: "administrators",
    fields: &[
        field("name", &["fullName"]),
        formatted("email", &["workEmail", "personalEmail"], FieldFormat::Email),
        field("phone", &["phoneNumber"]),
        field("position", &["title", "designation"]),
        field("schoolCode", &["school.code"]),
    ],
    searchable: &["name", "email", "position"],
    required: &["name", "email"],
    header_map: &[
        ("name", "name"),
        ("full name", "name"),
        ("email", "email"),
        ("email address", "email"),
        ("e-mail", "email"),
        ("phone", "phone"),
        ("phone number", "phone"),
        ("position", "position"),
        ("title", "position"),
        ("designation", "position"),
        ("school code", "schoolCode"),
        ("school", "schoolCode"),
    ],
    export_columns: &[
        ("name", "Name"),
        ("email", "Email"),
        ("phone", "Phone"),
        ("position", "Position"),
        ("schoolCode", "School Code"),
    ],
    default_role: Some("ADMIN"),
    needs_credentials: true,
};

// =============================================================================
// Schools
// =============================================================================

static SCHOOL: EntitySchema = EntitySchema {
    kind: EntityKind::School,
    list_path: "schools",
    create_path: "schools",
    key_field: "schoolCode",
    file_prefix: "schools",
    fields: &[
        field("name", &["schoolName"]),
        field("schoolCode", &["code"]),
        formatted("email", &["contactEmail"], FieldFormat::Email),
        field("phone", &["phoneNumber"]),
        field("county", &["region"]),
        field("address", &["location"]),
        field("principal", &["headTeacher"]),
        field("type", &["category"]),
    ],
    searchable: &["name", "schoolCode", "email", "county"],
    required: &["name", "schoolCode"],
    header_map: &[
        ("name", "name"),
        ("school name", "name"),
        ("code", "schoolCode"),
        ("school code", "schoolCode"),
        ("email", "email"),
        ("contact email", "email"),
        ("phone", "phone"),
        ("phone number", "phone"),
        ("county", "county"),
        ("region", "county"),
        ("address", "address"),
        ("location", "address"),
        ("principal", "principal"),
        ("head teacher", "principal"),
        ("type", "type"),
        ("category", "type"),
    ],
    export_columns: &[
        ("schoolCode", "School Code"),
        ("name", "School Name"),
        ("email", "Email"),
        ("phone", "Phone"),
        ("county", "County"),
        ("principal", "Principal"),
        ("type", "Type"),
    ],
    default_role: None,
    needs_credentials: false,
};

// =============================================================================
// Subjects
// =============================================================================

static SUBJECT: EntitySchema = EntitySchema {
    kind: EntityKind::Subject,
    list_path: "subjects",
    create_path: "subjects",
    key_field: "subjectCode",
    file_prefix: "subjects",
    fields: &[
        field("name", &["subjectName"]),
        field("subjectCode", &["code"]),
        field("department", &[]),
        field("description", &[]),
        field("lessonsPerWeek", &[]),
    ],
    searchable: &["name", "subjectCode", "department"],
    required: &["name", "subjectCode"],
    header_map: &[
        ("name", "name"),
        ("subject name", "name"),
        ("subject", "name"),
        ("code", "subjectCode"),
        ("subject code", "subjectCode"),
        ("department", "department"),
        ("description", "description"),
        ("lessons per week", "lessonsPerWeek"),
    ],
    export_columns: &[
        ("subjectCode", "Subject Code"),
        ("name", "Subject Name"),
        ("department", "Department"),
        ("lessonsPerWeek", "Lessons per Week"),
    ],
    default_role: None,
    needs_credentials: false,
};

// =============================================================================
// Timetable Entries
// =============================================================================

static TIMETABLE: EntitySchema = EntitySchema {
    kind: EntityKind::TimetableEntry,
    list_path: "timetables",
    create_path: "timetables",
    key_field: "id",
    file_prefix: "timetable",
    fields: &[
        field("day", &["dayOfWeek"]),
        formatted("startTime", &[], FieldFormat::Time),
        formatted("endTime", &[], FieldFormat::Time),
        field("subjectCode", &["subject.code"]),
        field("teacherCode", &["teacher.code"]),
        field("grade", &["className"]),
        field("room", &["venue"]),
    ],
    searchable: &["subjectCode", "teacherCode", "grade", "room", "day"],
    required: &["day", "startTime", "endTime", "subjectCode"],
    header_map: &[
        ("day", "day"),
        ("day of week", "day"),
        ("weekday", "day"),
        ("start", "startTime"),
        ("start time", "startTime"),
        ("end", "endTime"),
        ("end time", "endTime"),
        ("subject", "subjectCode"),
        ("subject code", "subjectCode"),
        ("teacher", "teacherCode"),
        ("teacher code", "teacherCode"),
        ("class", "grade"),
        ("grade", "grade"),
        ("room", "room"),
        ("venue", "room"),
    ],
    export_columns: &[
        ("day", "Day"),
        ("startTime", "Start Time"),
        ("endTime", "End Time"),
        ("subjectCode", "Subject Code"),
        ("teacherCode", "Teacher Code"),
        ("grade", "Grade"),
        ("room", "Room"),
    ],
    default_role: None,
    needs_credentials: false,
};
