mod contiguous_ranges;
mod working_days;
