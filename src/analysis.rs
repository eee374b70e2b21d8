//! Wrapped-style statistics over a streaming history.
//!
//! Every function takes the plays in any order. Rankings break ties by name
//! so reports are stable between runs.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Datelike, TimeDelta, Timelike, Utc};
use serde::Serialize;

use crate::clients::history::{ContentType, Play};

/// Silence longer than this starts a new listening session.
pub const SESSION_GAP_MINUTES: i64 = 20;
/// Minimum plays before a track shows up in the skip ranking.
pub const MIN_PLAYS_FOR_SKIP_RANKING: usize = 5;
/// Minimum run length counted as a binge when ranking artists.
pub const MIN_BINGE_PLAYS: usize = 3;
/// Length of the top lists.
pub const TOP_N: usize = 10;
/// Length of the per-year top lists.
pub const YEARLY_TOP_N: usize = 5;

/// Name with a total, minutes or a play count.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Ranked<V> {
    /// Artist, track or album name
    pub name: String,
    /// Total for the name
    pub value: V,
}

/// Overall numbers for the whole history.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BasicStats {
    /// Total listening time
    pub total_hours: f64,
    /// Number of streams
    pub total_plays: usize,
    /// Distinct track names
    pub unique_tracks: usize,
    /// Distinct artist names
    pub unique_artists: usize,
    /// Distinct album names
    pub unique_albums: usize,
    /// Streams per content type
    pub content_type_counts: BTreeMap<ContentType, usize>,
    /// Earliest stream
    pub first_play: Option<DateTime<Utc>>,
    /// Latest stream
    pub last_play: Option<DateTime<Utc>>,
    /// Five most used platforms by stream count
    pub platform_usage: Vec<Ranked<usize>>,
    /// Percentage of streams skipped, among streams that record it
    pub skip_rate: Option<f64>,
    /// Percentage of streams on shuffle, among streams that record it
    pub shuffle_rate: Option<f64>,
    /// Distinct client IP addresses
    pub unique_ips: usize,
}

/// Highlights of one calendar year.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct YearSummary {
    /// Top artists by minutes
    pub top_artists: Vec<Ranked<f64>>,
    /// Top tracks by minutes
    pub top_tracks: Vec<Ranked<f64>>,
    /// Minutes per month, keyed 1 to 12
    pub monthly_minutes: BTreeMap<u32, f64>,
    /// Listening time in the year
    pub total_hours: f64,
}

/// A frequently played track and how often it was skipped.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SkippedTrack {
    /// Track name
    pub name: String,
    /// Percentage of its streams that were skipped
    pub skip_rate: f64,
    /// Number of streams
    pub plays: usize,
}

/// Skip ranking and skip rate by hour of day.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SkipBehavior {
    /// Most skipped frequently played tracks
    pub most_skipped: Vec<SkippedTrack>,
    /// Skip percentage per UTC hour, `None` for hours with no data
    pub hourly_skip_rate: [Option<f64>; 24],
}

/// Plays with no gap longer than [`SESSION_GAP_MINUTES`] between them.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Session {
    /// First stream of the session
    pub start: DateTime<Utc>,
    /// Number of streams
    pub tracks_played: usize,
    /// Sum of listening time
    pub duration_minutes: f64,
    /// Sum of the gaps between consecutive streams
    pub gap_minutes: f64,
}

/// Aggregate over all sessions.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// Number of sessions
    pub total_sessions: usize,
    /// Mean listening time per session
    pub avg_session_minutes: f64,
    /// Mean streams per session
    pub avg_tracks_per_session: f64,
    /// Session with the most listening time
    pub longest: Session,
}

/// Consecutive streams of one artist.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Binge {
    /// Artist name
    pub artist: String,
    /// Streams in the run
    pub consecutive_plays: usize,
    /// Listening time in the run
    pub duration_minutes: f64,
    /// First stream of the run
    pub start: DateTime<Utc>,
}

/// Everything the `wrapped` command reports.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WrappedReport {
    /// Overall numbers
    pub basic: BasicStats,
    /// Top artists by minutes
    pub top_artists: Vec<Ranked<f64>>,
    /// Top albums by minutes
    pub top_albums: Vec<Ranked<f64>>,
    /// Top tracks by minutes
    pub top_tracks: Vec<Ranked<f64>>,
    /// Top tracks by play count
    pub most_played_tracks: Vec<Ranked<usize>>,
    /// Minutes per UTC hour, per year
    pub hourly_minutes: BTreeMap<i32, [f64; 24]>,
    /// Minutes per weekday, Monday first
    pub weekday_minutes: [f64; 7],
    /// Per-year highlights
    pub years: BTreeMap<i32, YearSummary>,
    /// Skip behaviour
    pub skips: SkipBehavior,
    /// Session aggregate, `None` without plays
    pub sessions: Option<SessionStats>,
    /// Longest artist runs
    pub longest_binges: Vec<Binge>,
    /// Artists with the most runs of [`MIN_BINGE_PLAYS`] or more
    pub binge_artists: Vec<Ranked<usize>>,
}

impl WrappedReport {
    /// Compute the full report.
    pub fn from_plays(plays: &[Play]) -> Self {
        let binges = binge_runs(plays);
        WrappedReport {
            basic: basic_stats(plays),
            top_artists: top_by_minutes(plays, |p| p.artist_name.as_deref(), TOP_N),
            top_albums: top_by_minutes(plays, |p| p.album_name.as_deref(), TOP_N),
            top_tracks: top_by_minutes(plays, |p| p.track_name.as_deref(), TOP_N),
            most_played_tracks: top_by_plays(plays, |p| p.track_name.as_deref(), TOP_N),
            hourly_minutes: hourly_minutes_by_year(plays),
            weekday_minutes: weekday_minutes(plays),
            years: yearly_trends(plays),
            skips: skip_behavior(plays),
            sessions: session_stats(&split_sessions(plays)),
            longest_binges: longest_binges(&binges, TOP_N),
            binge_artists: binge_artists(&binges, MIN_BINGE_PLAYS, TOP_N),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(hits: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| hits as f64 * 100.0 / total as f64)
}

fn flag_rate(plays: &[Play], flag: impl Fn(&Play) -> Option<bool>) -> Option<f64> {
    let known: Vec<bool> = plays.iter().filter_map(flag).collect();
    percent(known.iter().filter(|b| **b).count(), known.len())
}

fn distinct<'a>(plays: &'a [Play], key: impl Fn(&'a Play) -> Option<&'a str>) -> usize {
    plays.iter().filter_map(key).collect::<HashSet<_>>().len()
}

fn minutes_to_hours(minutes: f64) -> f64 {
    minutes / 60.0
}

fn sorted_by_time(plays: &[Play]) -> Vec<&Play> {
    let mut sorted: Vec<&Play> = plays.iter().collect();
    sorted.sort_by_key(|p| p.ts);
    sorted
}

fn rank<V: Copy>(
    totals: HashMap<&str, V>,
    n: usize,
    cmp: impl Fn(&V, &V) -> Ordering,
) -> Vec<Ranked<V>> {
    let mut ranked: Vec<(&str, V)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| cmp(&b.1, &a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(n)
        .map(|(name, value)| Ranked {
            name: name.to_string(),
            value,
        })
        .collect()
}

/// Top `n` names by summed minutes. Plays without a name are left out.
pub fn top_by_minutes<'a>(
    plays: &'a [Play],
    key: impl Fn(&'a Play) -> Option<&'a str>,
    n: usize,
) -> Vec<Ranked<f64>> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for play in plays {
        if let Some(name) = key(play) {
            *totals.entry(name).or_default() += play.minutes_played;
        }
    }
    rank(totals, n, f64::total_cmp)
}

/// Top `n` names by number of streams.
pub fn top_by_plays<'a>(
    plays: &'a [Play],
    key: impl Fn(&'a Play) -> Option<&'a str>,
    n: usize,
) -> Vec<Ranked<usize>> {
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for play in plays {
        if let Some(name) = key(play) {
            *totals.entry(name).or_default() += 1;
        }
    }
    rank(totals, n, usize::cmp)
}

/// Totals, distinct counts, date range, platforms and flag rates.
pub fn basic_stats(plays: &[Play]) -> BasicStats {
    let mut content_type_counts = BTreeMap::new();
    for play in plays {
        *content_type_counts.entry(play.content_type).or_default() += 1;
    }

    BasicStats {
        total_hours: minutes_to_hours(plays.iter().map(|p| p.minutes_played).sum()),
        total_plays: plays.len(),
        unique_tracks: distinct(plays, |p| p.track_name.as_deref()),
        unique_artists: distinct(plays, |p| p.artist_name.as_deref()),
        unique_albums: distinct(plays, |p| p.album_name.as_deref()),
        content_type_counts,
        first_play: plays.iter().map(|p| p.ts).min(),
        last_play: plays.iter().map(|p| p.ts).max(),
        platform_usage: top_by_plays(plays, |p| p.platform.as_deref(), 5),
        skip_rate: flag_rate(plays, |p| p.skipped),
        shuffle_rate: flag_rate(plays, |p| p.shuffle),
        unique_ips: distinct(plays, |p| p.ip_addr.as_deref()),
    }
}

/// Minutes per UTC hour of day, split by year.
pub fn hourly_minutes_by_year(plays: &[Play]) -> BTreeMap<i32, [f64; 24]> {
    let mut years: BTreeMap<i32, [f64; 24]> = BTreeMap::new();
    for play in plays {
        let hours = years.entry(play.ts.year()).or_insert([0.0; 24]);
        hours[play.ts.hour() as usize] += play.minutes_played;
    }
    years
}

/// Minutes per weekday, Monday first.
pub fn weekday_minutes(plays: &[Play]) -> [f64; 7] {
    let mut days = [0.0; 7];
    for play in plays {
        days[play.ts.weekday().num_days_from_monday() as usize] += play.minutes_played;
    }
    days
}

/// Top artists, top tracks and monthly minutes for every year with plays.
pub fn yearly_trends(plays: &[Play]) -> BTreeMap<i32, YearSummary> {
    let mut by_year: BTreeMap<i32, Vec<Play>> = BTreeMap::new();
    for play in plays {
        by_year.entry(play.ts.year()).or_default().push(play.clone());
    }

    by_year
        .into_iter()
        .map(|(year, year_plays)| {
            let mut monthly_minutes = BTreeMap::new();
            for play in &year_plays {
                *monthly_minutes.entry(play.ts.month()).or_default() += play.minutes_played;
            }
            let summary = YearSummary {
                top_artists: top_by_minutes(&year_plays, |p| p.artist_name.as_deref(), YEARLY_TOP_N),
                top_tracks: top_by_minutes(&year_plays, |p| p.track_name.as_deref(), YEARLY_TOP_N),
                monthly_minutes,
                total_hours: minutes_to_hours(year_plays.iter().map(|p| p.minutes_played).sum()),
            };
            (year, summary)
        })
        .collect()
}

/// Most skipped tracks among those with [`MIN_PLAYS_FOR_SKIP_RANKING`] streams,
/// and the skip rate by hour of day.
pub fn skip_behavior(plays: &[Play]) -> SkipBehavior {
    let mut per_track: HashMap<&str, Vec<&Play>> = HashMap::new();
    for play in plays {
        if let Some(name) = play.track_name.as_deref() {
            per_track.entry(name).or_default().push(play);
        }
    }

    let mut most_skipped: Vec<SkippedTrack> = per_track
        .into_iter()
        .filter(|(_, track_plays)| track_plays.len() >= MIN_PLAYS_FOR_SKIP_RANKING)
        .filter_map(|(name, track_plays)| {
            let known: Vec<bool> = track_plays.iter().filter_map(|p| p.skipped).collect();
            let skip_rate = percent(known.iter().filter(|b| **b).count(), known.len())?;
            Some(SkippedTrack {
                name: name.to_string(),
                skip_rate,
                plays: track_plays.len(),
            })
        })
        .collect();
    most_skipped.sort_by(|a, b| {
        b.skip_rate
            .total_cmp(&a.skip_rate)
            .then_with(|| b.plays.cmp(&a.plays))
            .then_with(|| a.name.cmp(&b.name))
    });
    most_skipped.truncate(TOP_N);

    let mut skipped = [0usize; 24];
    let mut known = [0usize; 24];
    for play in plays {
        if let Some(was_skipped) = play.skipped {
            let hour = play.ts.hour() as usize;
            known[hour] += 1;
            if was_skipped {
                skipped[hour] += 1;
            }
        }
    }
    let hourly_skip_rate = std::array::from_fn(|hour| percent(skipped[hour], known[hour]));

    SkipBehavior {
        most_skipped,
        hourly_skip_rate,
    }
}

#[allow(clippy::cast_precision_loss)]
fn delta_minutes(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 60_000.0
}

/// Split plays into sessions, in time order.
///
/// A new session starts when a stream began more than [`SESSION_GAP_MINUTES`]
/// after the previous one.
pub fn split_sessions(plays: &[Play]) -> Vec<Session> {
    let max_gap = TimeDelta::minutes(SESSION_GAP_MINUTES);
    let mut sessions: Vec<Session> = Vec::new();
    let mut previous: Option<DateTime<Utc>> = None;

    for play in sorted_by_time(plays) {
        let gap = previous
            .map(|prev| play.ts - prev)
            .filter(|gap| *gap <= max_gap);
        if let (Some(gap), Some(current)) = (gap, sessions.last_mut()) {
            current.tracks_played += 1;
            current.duration_minutes += play.minutes_played;
            current.gap_minutes += delta_minutes(gap);
        } else {
            sessions.push(Session {
                start: play.ts,
                tracks_played: 1,
                duration_minutes: play.minutes_played,
                gap_minutes: 0.0,
            });
        }
        previous = Some(play.ts);
    }
    sessions
}

/// Averages and the longest session, `None` when there are no sessions.
pub fn session_stats(sessions: &[Session]) -> Option<SessionStats> {
    let longest = sessions
        .iter()
        .max_by(|a, b| a.duration_minutes.total_cmp(&b.duration_minutes))?
        .clone();

    #[allow(clippy::cast_precision_loss)]
    let count = sessions.len() as f64;
    #[allow(clippy::cast_precision_loss)]
    let tracks = sessions.iter().map(|s| s.tracks_played).sum::<usize>() as f64;

    Some(SessionStats {
        total_sessions: sessions.len(),
        avg_session_minutes: sessions.iter().map(|s| s.duration_minutes).sum::<f64>() / count,
        avg_tracks_per_session: tracks / count,
        longest,
    })
}

/// Runs of consecutive streams by the same artist, in time order.
///
/// A stream without an artist ends the current run and starts none.
pub fn binge_runs(plays: &[Play]) -> Vec<Binge> {
    let mut runs: Vec<Binge> = Vec::new();
    let mut in_run = false;

    for play in sorted_by_time(plays) {
        let Some(artist) = play.artist_name.as_deref() else {
            in_run = false;
            continue;
        };
        if let Some(run) = runs.last_mut().filter(|run| in_run && run.artist == artist) {
            run.consecutive_plays += 1;
            run.duration_minutes += play.minutes_played;
        } else {
            runs.push(Binge {
                artist: artist.to_string(),
                consecutive_plays: 1,
                duration_minutes: play.minutes_played,
                start: play.ts,
            });
        }
        in_run = true;
    }
    runs
}

/// The `n` longest runs by play count, earliest first on ties.
pub fn longest_binges(binges: &[Binge], n: usize) -> Vec<Binge> {
    let mut longest = binges.to_vec();
    longest.sort_by(|a, b| {
        b.consecutive_plays
            .cmp(&a.consecutive_plays)
            .then_with(|| a.start.cmp(&b.start))
    });
    longest.truncate(n);
    longest
}

/// Artists ranked by how many runs of at least `min_plays` they have.
pub fn binge_artists(binges: &[Binge], min_plays: usize, n: usize) -> Vec<Ranked<usize>> {
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for binge in binges.iter().filter(|b| b.consecutive_plays >= min_plays) {
        *totals.entry(binge.artist.as_str()).or_default() += 1;
    }
    rank(totals, n, usize::cmp)
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn write_ranked<V>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    ranked: &[Ranked<V>],
    value: fn(&V) -> String,
) -> fmt::Result {
    writeln!(f, "\n{title}")?;
    for (i, entry) in ranked.iter().enumerate() {
        writeln!(f, "{:>3}. {} ({})", i + 1, entry.name, value(&entry.value))?;
    }
    Ok(())
}

fn minutes(value: &f64) -> String {
    format!("{value:.0} min")
}

fn streams(value: &usize) -> String {
    format!("{value} streams")
}

fn write_rate(f: &mut fmt::Formatter<'_>, label: &str, rate: Option<f64>) -> fmt::Result {
    match rate {
        Some(rate) => writeln!(f, "{label}: {rate:.1}%"),
        None => writeln!(f, "{label}: n/a"),
    }
}

impl fmt::Display for WrappedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let basic = &self.basic;
        writeln!(f, "Listening summary")?;
        writeln!(f, "Total listening time: {:.1} hours", basic.total_hours)?;
        writeln!(f, "Streams: {}", basic.total_plays)?;
        writeln!(
            f,
            "Unique tracks: {}, artists: {}, albums: {}",
            basic.unique_tracks, basic.unique_artists, basic.unique_albums
        )?;
        if let (Some(first), Some(last)) = (basic.first_play, basic.last_play) {
            writeln!(f, "Date range: {} to {}", first.date_naive(), last.date_naive())?;
        }
        for (content_type, count) in &basic.content_type_counts {
            writeln!(f, "  {content_type}: {count}")?;
        }
        write_rate(f, "Skip rate", basic.skip_rate)?;
        write_rate(f, "Shuffle rate", basic.shuffle_rate)?;
        writeln!(f, "Unique IP addresses: {}", basic.unique_ips)?;

        write_ranked(f, "Platforms", &basic.platform_usage, streams)?;
        write_ranked(f, "Top artists", &self.top_artists, minutes)?;
        write_ranked(f, "Top albums", &self.top_albums, minutes)?;
        write_ranked(f, "Top tracks", &self.top_tracks, minutes)?;
        write_ranked(f, "Most played tracks", &self.most_played_tracks, streams)?;

        writeln!(f, "\nListening by weekday")?;
        for (day, minutes) in WEEKDAYS.iter().zip(self.weekday_minutes) {
            writeln!(f, "  {day}: {minutes:.0} min")?;
        }

        for (year, summary) in &self.years {
            writeln!(f, "\n{year}: {:.1} hours", summary.total_hours)?;
            if let Some(top) = summary.top_artists.first() {
                writeln!(f, "  Top artist: {} ({:.0} min)", top.name, top.value)?;
            }
            if let Some(top) = summary.top_tracks.first() {
                writeln!(f, "  Top track: {} ({:.0} min)", top.name, top.value)?;
            }
            if let Some(hours) = self.hourly_minutes.get(year) {
                let peak = (0..24).max_by(|a, b| hours[*a].total_cmp(&hours[*b]).then(b.cmp(a)));
                if let Some(peak) = peak {
                    writeln!(f, "  Peak hour: {peak:02}:00 UTC")?;
                }
            }
        }

        writeln!(f, "\nMost skipped tracks")?;
        for track in &self.skips.most_skipped {
            writeln!(
                f,
                "  {} ({:.1}% of {} streams)",
                track.name, track.skip_rate, track.plays
            )?;
        }

        if let Some(sessions) = &self.sessions {
            writeln!(f, "\nSessions: {}", sessions.total_sessions)?;
            writeln!(
                f,
                "Average session: {:.1} min, {:.1} streams",
                sessions.avg_session_minutes, sessions.avg_tracks_per_session
            )?;
            writeln!(
                f,
                "Longest session: {:.1} min, {} streams on {}",
                sessions.longest.duration_minutes,
                sessions.longest.tracks_played,
                sessions.longest.start.date_naive()
            )?;
        }

        writeln!(f, "\nLongest binges")?;
        for binge in &self.longest_binges {
            writeln!(
                f,
                "  {}: {} in a row ({:.1} min) on {}",
                binge.artist,
                binge.consecutive_plays,
                binge.duration_minutes,
                binge.start.date_naive()
            )?;
        }
        write_ranked(f, "Most binged artists", &self.binge_artists, |n| format!("{n} binges"))
    }
}
