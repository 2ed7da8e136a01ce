//! Interchange fixtures covering each kind of block the codec reads.

/// Weekly zoned event with an explicit exception.
pub const WEEKLY_ZONED: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
BEGIN:VEVENT\r\n\
UID:weekly@example.com\r\n\
DTSTAMP:20260101T000000Z\r\n\
DTSTART;TZID=America/New_York:20260105T090000\r\n\
DTEND;TZID=America/New_York:20260105T100000\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO,WE;UNTIL=20260401T000000Z\r\n\
EXDATE;TZID=America/New_York:20260114T090000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// Counted monthly rule with an exclusion rule on the same anchor.
pub const MONTHLY_WITH_EXRULE: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
BEGIN:VEVENT\r\n\
UID:monthly@example.com\r\n\
DTSTART:20260130T170000Z\r\n\
DTEND:20260130T180000Z\r\n\
RRULE:FREQ=MONTHLY;BYDAY=-1FR;COUNT=12\r\n\
EXRULE:FREQ=MONTHLY;BYMONTH=7;BYDAY=-1FR\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// Full-day yearly event with a DATE-form UNTIL.
pub const FULL_DAY_YEARLY: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
X-WR-TIMEZONE:Europe/Paris\r\n\
BEGIN:VEVENT\r\n\
UID:yearly@example.com\r\n\
DTSTART;VALUE=DATE:20260214\r\n\
RRULE:FREQ=YEARLY;UNTIL=20300214\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// A single event plus explicit extra dates.
pub const SINGLE_WITH_RDATES: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
X-WR-TIMEZONE:Europe/Paris\r\n\
BEGIN:VEVENT\r\n\
UID:single@example.com\r\n\
DTSTART:20260601T080000Z\r\n\
DTEND:20260601T090000Z\r\n\
RDATE;TZID=Europe/Paris:20260610T100000,20260620T100000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

pub const ALL: [&str; 4] = [
    WEEKLY_ZONED,
    MONTHLY_WITH_EXRULE,
    FULL_DAY_YEARLY,
    SINGLE_WITH_RDATES,
];
